use super::{file_part, trim_base};
use crate::error::{EngineError, Result};
use crate::fetcher::{HttpFetcher, RequestBody, params};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::CopyseekerResponse;
use crate::reverse_search::parsers::copyseeker::{discovery_id, first_frame};
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::SearchResponse;
use crate::types::{EngineKind, ImageInput, ImageSource};
use serde_json::json;

/// 各 server action 的 `next-action` 代碼
const URL_SEARCH_TOKEN: &str = "401c0a10f9d5aa3972a00e210283699640fbc08a21";
const FILE_UPLOAD_TOKEN: &str = "40e8441120d8ae3a0c72687eb64242d642081e8ddb";
const SET_COOKIE_TOKEN: &str = "0015445749632853586010cae7d4f7587b0a2eac4e";
const GET_RESULTS_TOKEN: &str = "40d33eda9b5e7a28d089feea4356d5925a1931b2f7";

pub struct CopyseekerService {
    fetcher: HttpFetcher,
    base_url: String,
}

impl CopyseekerService {
    pub const BASE_URL: &'static str = "https://copyseeker.net";

    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    async fn discover(&self, source: ImageSource<'_>) -> Result<Option<String>> {
        self.fetcher
            .post(
                "copyseeker set cookie",
                &self.base_url,
                &[],
                &[("next-action", SET_COOKIE_TOKEN)],
                RequestBody::Text {
                    content_type: "text/plain;charset=UTF-8".into(),
                    body: "[]".into(),
                },
            )
            .await?;

        let (token, body) = match source {
            ImageSource::Url(url) => (
                URL_SEARCH_TOKEN,
                RequestBody::Json(json!([{
                    "discoveryType": "ReverseImageSearch",
                    "imageUrl": url
                }])),
            ),
            ImageSource::File(file) => (
                FILE_UPLOAD_TOKEN,
                RequestBody::Multipart {
                    fields: params([
                        ("1_discoveryType", "ReverseImageSearch"),
                        ("0", r#"["$K1"]"#),
                    ]),
                    files: vec![
                        file_part("1_file", file)
                            .await?
                            .file_name("image.jpg")
                            .mime("image/jpeg"),
                    ],
                },
            ),
        };

        let resp = self
            .fetcher
            .post("copyseeker discovery", &self.base_url, &[], &[("next-action", token)], body)
            .await?;
        Ok(discovery_id(&resp.text))
    }

    pub async fn search(&self, input: &ImageInput) -> Result<CopyseekerResponse> {
        let source = input.source()?;
        let Some(id) = self.discover(source).await? else {
            tracing::debug!("copyseeker returned no discovery id");
            return Ok(CopyseekerResponse::empty(""));
        };

        let resp = self
            .fetcher
            .post(
                "copyseeker results",
                &format!("{}/discovery", self.base_url),
                &[],
                &[("next-action", GET_RESULTS_TOKEN)],
                RequestBody::Json(json!([{"discoveryId": id, "hasBlocker": false}])),
            )
            .await?;
        let frame = first_frame(&resp.text)
            .ok_or_else(|| {
                EngineError::DiscoveryFailed(format!("no results frame for discovery {}", id))
            })?;
        CopyseekerResponse::parse(&frame, &resp.url)
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for CopyseekerService {
    fn kind(&self) -> EngineKind {
        EngineKind::Copyseeker
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(CopyseekerService::search(self, input).await?.into())
    }
}
