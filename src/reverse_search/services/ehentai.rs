use super::{image_bytes, trim_base};
use crate::error::Result;
use crate::fetcher::{FilePart, HttpFetcher, Params, RequestBody};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::EHentaiResponse;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::{SearchParameters, SearchResponse, decode_params};
use crate::types::{EngineKind, ImageInput};
use serde::Deserialize;

/// E-Hentai 參數
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EHentaiParams {
    /// 使用 ExHentai（需要登入 cookie）
    pub is_ex: bool,
    pub covers: bool,
    pub similar: bool,
    pub exp: bool,
}

impl Default for EHentaiParams {
    fn default() -> Self {
        Self {
            is_ex: false,
            covers: false,
            similar: true,
            exp: false,
        }
    }
}

impl EHentaiParams {
    /// 開啟的選項以 `on` 欄位送出，關閉的不送
    fn form_fields(&self) -> Params {
        let mut fields = vec![("f_sfile".to_string(), "File Search".to_string())];
        for (enabled, name) in [
            (self.covers, "fs_covers"),
            (self.similar, "fs_similar"),
            (self.exp, "fs_exp"),
        ] {
            if enabled {
                fields.push((name.to_string(), "on".to_string()));
            }
        }
        fields
    }
}

pub struct EHentaiService {
    fetcher: HttpFetcher,
    base_url: String,
    params: EHentaiParams,
}

impl EHentaiService {
    pub const EH_BASE_URL: &'static str = "https://upld.e-hentai.org";
    pub const EX_BASE_URL: &'static str = "https://upld.exhentai.org";

    pub fn new(fetcher: HttpFetcher, params: EHentaiParams) -> Self {
        let base_url = if params.is_ex { Self::EX_BASE_URL } else { Self::EH_BASE_URL };
        Self {
            fetcher,
            base_url: base_url.to_string(),
            params,
        }
    }

    pub fn from_parameters(fetcher: HttpFetcher, params: &SearchParameters) -> Result<Self> {
        Ok(Self::new(fetcher, decode_params(EngineKind::EHentai, params)?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    fn endpoint(&self) -> String {
        let path = if self.params.is_ex { "upld/image_lookup.php" } else { "image_lookup.php" };
        format!("{}/{}", self.base_url, path)
    }

    pub async fn search(&self, input: &ImageInput) -> Result<EHentaiResponse> {
        let source = input.source()?;
        let (bytes, file_name) = image_bytes(&self.fetcher, source, "ehentai download").await?;

        let resp = self
            .fetcher
            .post(
                "ehentai search",
                &self.endpoint(),
                &[],
                &[],
                RequestBody::Multipart {
                    fields: self.params.form_fields(),
                    files: vec![FilePart::new("sfile", bytes).file_name(file_name)],
                },
            )
            .await?;
        EHentaiResponse::parse(&resp.text, &resp.url)
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for EHentaiService {
    fn kind(&self) -> EngineKind {
        EngineKind::EHentai
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(EHentaiService::search(self, input).await?.into())
    }
}
