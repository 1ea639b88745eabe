use super::{image_bytes, trim_base};
use crate::error::Result;
use crate::fetcher::{FilePart, HttpFetcher, RequestBody, params};
use crate::parser::{ResponseParser, deep_str};
use crate::reverse_search::parsers::BaiDuResponse;
use crate::reverse_search::parsers::baidu::{CardScan, extract_card_data, scan_cards};
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::SearchResponse;
use crate::types::{EngineKind, ImageInput};

pub struct BaiDuService {
    fetcher: HttpFetcher,
    base_url: String,
}

impl BaiDuService {
    pub const BASE_URL: &'static str = "https://graph.baidu.com";

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

    pub async fn search(&self, input: &ImageInput) -> Result<BaiDuResponse> {
        let source = input.source()?;
        let (bytes, file_name) = image_bytes(&self.fetcher, source, "baidu download").await?;

        // 1. 上傳
        let upload = self
            .fetcher
            .post(
                "baidu upload",
                &format!("{}/upload", self.base_url),
                &[],
                &[("Acs-Token", "")],
                RequestBody::Multipart {
                    fields: params([("from", "pc")]),
                    files: vec![FilePart::new("image", bytes).file_name(file_name)],
                },
            )
            .await?;
        let Some(data_url) =
            deep_str(&upload.json("baidu upload")?, "data.url").filter(|u| !u.is_empty())
        else {
            tracing::debug!("baidu upload returned no result page");
            return Ok(BaiDuResponse::empty(&upload.url));
        };

        // 2. 結果頁中的卡片
        let page = self.fetcher.get("baidu result page", &data_url, &[], &[]).await?;
        match scan_cards(&extract_card_data(&page.text)) {
            CardScan::NoResult | CardScan::Nothing => Ok(BaiDuResponse::empty(&data_url)),
            CardScan::Similar { first_url, same } => {
                // 3. 相似圖片清單
                let resp = self.fetcher.get("baidu similar", &first_url, &[], &[]).await?;
                let mut payload = resp.json("baidu similar")?;
                if let (Some(same), Some(object)) = (same, payload.as_object_mut()) {
                    object.insert("same".into(), same);
                }
                BaiDuResponse::parse(&payload, &data_url)
            }
        }
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for BaiDuService {
    fn kind(&self) -> EngineKind {
        EngineKind::BaiDu
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(BaiDuService::search(self, input).await?.into())
    }
}
