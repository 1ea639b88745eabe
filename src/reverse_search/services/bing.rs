use super::trim_base;
use crate::error::{EngineError, Result};
use crate::fetcher::{FilePart, HttpFetcher, Params, RequestBody, params};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::BingResponse;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::SearchResponse;
use crate::types::{EngineKind, ImageInput, ImageSource};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

static BCID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"bcid_[A-Za-z0-9\-.]+").unwrap_or_else(|_| unreachable!("static regex"))
});

/// 從上傳結果頁找出 insights token
pub fn find_bcid(html: &str) -> Option<&str> {
    BCID_RE.find(html).map(|m| m.as_str())
}

pub struct BingService {
    fetcher: HttpFetcher,
    base_url: String,
}

impl BingService {
    pub const BASE_URL: &'static str = "https://www.bing.com";

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

    fn url_search_page(&self, image_url: &str) -> String {
        format!(
            "{}/images/search?view=detailv2&iss=sbi&FORM=SBIHMP&sbisrc=UrlPaste&q=imgurl:{}&idpbck=1",
            self.base_url,
            urlencoding::encode(image_url)
        )
    }

    /// 上傳圖片，回傳 (bcid, 結果頁 URL)
    async fn upload(&self, bytes: &[u8]) -> Result<(String, String)> {
        let endpoint = format!("{}/images/search", self.base_url);
        let query = params([("view", "detailv2"), ("iss", "sbiupload")]);
        let body = RequestBody::Multipart {
            fields: params([("cbir", "sbi".to_string()), ("imageBin", STANDARD.encode(bytes))]),
            files: Vec::new(),
        };

        let resp = self
            .fetcher
            .post("bing upload", &endpoint, &query, &[], body)
            .await?;
        let bcid = find_bcid(&resp.text)
            .ok_or_else(|| EngineError::TokenNotFound("BCID not found on page".into()))?;
        tracing::debug!(bcid, "bing upload accepted");
        Ok((bcid.to_string(), resp.url))
    }

    async fn knowledge(
        &self,
        referer: &str,
        mut query: Params,
        image_info: serde_json::Value,
    ) -> Result<BingResponse> {
        let endpoint = format!("{}/images/api/custom/knowledge", self.base_url);
        query.extend(params([
            ("rshighlight", "true"),
            ("textDecorations", "true"),
            ("internalFeatures", "similarproducts,share"),
            ("nbl", "1"),
            ("FORM", "SBIHMP"),
            ("safeSearch", "off"),
            ("mkt", "en-us"),
            ("setLang", "en-us"),
            ("iss", "sbi"),
            ("IID", "idpins"),
            ("SFX", "1"),
        ]));
        let body = RequestBody::Multipart {
            fields: Vec::new(),
            files: vec![
                FilePart::new("knowledgeRequest", image_info.to_string()).mime("application/json"),
            ],
        };

        let resp = self
            .fetcher
            .post("bing knowledge", &endpoint, &query, &[("Referer", referer)], body)
            .await?;
        BingResponse::parse(&resp.json("bing knowledge")?, &resp.url)
    }

    pub async fn search(&self, input: &ImageInput) -> Result<BingResponse> {
        let (resolved_url, mut response) = match input.source()? {
            ImageSource::Url(url) => {
                let page = self.url_search_page(url);
                let info = json!({"imageInfo": {"url": url, "source": "Url"}});
                let response = self.knowledge(&page, Vec::new(), info).await?;
                (page, response)
            }
            ImageSource::File(file) => {
                let bytes = file.read().await?;
                let (bcid, page) = self.upload(&bytes).await?;
                // 上傳產生的 cookie 會讓 knowledge 請求失敗
                self.fetcher.clear_cookies();
                let referer = format!("{}/images/search?insightsToken={}", self.base_url, bcid);
                let info = json!({"imageInfo": {"imageInsightsToken": bcid, "source": "Gallery"}});
                let response = self
                    .knowledge(&referer, params([("insightsToken", bcid.as_str())]), info)
                    .await?;
                (page, response)
            }
        };
        response.url = resolved_url;
        Ok(response)
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for BingService {
    fn kind(&self) -> EngineKind {
        EngineKind::Bing
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(BingService::search(self, input).await?.into())
    }
}
