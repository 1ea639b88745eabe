use super::{file_part, trim_base};
use crate::error::Result;
use crate::fetcher::{HttpFetcher, Params, RequestBody};
use crate::parser::{ResponseParser, deep_str};
use crate::reverse_search::parsers::TinEyeResponse;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::{SearchParameters, SearchResponse, decode_params};
use crate::types::{DomainInfo, EngineKind, ImageInput, ImageSource};
use reqwest::Url;
use serde::Deserialize;

/// TinEye 參數
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TinEyeParams {
    pub show_unavailable_domains: bool,
    /// 只看指定網域
    pub domain: String,
    /// score / size / crawl_date
    pub sort: String,
    pub order: String,
    pub tags: String,
}

impl Default for TinEyeParams {
    fn default() -> Self {
        Self {
            show_unavailable_domains: false,
            domain: String::new(),
            sort: "score".to_string(),
            order: "desc".to_string(),
            tags: String::new(),
        }
    }
}

impl TinEyeParams {
    /// 只送出有值的欄位
    fn form_fields(&self) -> Params {
        let show_unavailable = if self.show_unavailable_domains { "true" } else { "" };
        [
            ("sort", self.sort.as_str()),
            ("order", self.order.as_str()),
            ("page", "1"),
            ("show_unavailable_domains", show_unavailable),
            ("tags", self.tags.as_str()),
            ("domain", self.domain.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }
}

/// 把結果頁 URL 改寫成指定頁碼的 API URL
pub fn page_api_url(resolved_url: &str, page: u32) -> Option<String> {
    let mut url = Url::parse(resolved_url).ok()?;
    let path = url.path().replacen("/search/", "/api/v1/result_json/", 1);
    url.set_path(&path);

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "page" { page.to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    Some(url.to_string())
}

pub struct TinEyeService {
    fetcher: HttpFetcher,
    base_url: String,
    params: TinEyeParams,
}

impl TinEyeService {
    pub const BASE_URL: &'static str = "https://tineye.com";

    pub fn new(fetcher: HttpFetcher, params: TinEyeParams) -> Self {
        Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
            params,
        }
    }

    pub fn from_parameters(fetcher: HttpFetcher, params: &SearchParameters) -> Result<Self> {
        Ok(Self::new(fetcher, decode_params(EngineKind::TinEye, params)?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    /// 網域統計（失敗時回傳空列表）
    async fn domains(&self, query_hash: &str) -> Vec<DomainInfo> {
        let url = format!("{}/api/v1/search/get_domains/{}", self.base_url, query_hash);
        let result = match self.fetcher.get("tineye domains", &url, &[], &[]).await {
            Ok(resp) => resp.json("tineye domains"),
            Err(e) => Err(e),
        };
        match result {
            Ok(payload) => payload
                .get("domains")
                .and_then(|d| d.as_array())
                .map(|domains| domains.iter().filter_map(DomainInfo::from_raw).collect())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "tineye domain lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn search(&self, input: &ImageInput) -> Result<TinEyeResponse> {
        let source = input.source()?;
        let endpoint = format!("{}/api/v1/result_json/", self.base_url);
        let mut fields = self.params.form_fields();

        let body = match source {
            ImageSource::Url(url) => {
                fields.push(("url".to_string(), url.to_string()));
                RequestBody::Form(fields.clone())
            }
            ImageSource::File(file) => RequestBody::Multipart {
                fields: fields.clone(),
                files: vec![file_part("image", file).await?],
            },
        };

        let resp = self
            .fetcher
            .post("tineye search", &endpoint, &[], &[], body)
            .await?;
        let payload = resp.json("tineye search")?;

        let mut resolved_url = resp.url.clone();
        let mut domains = Vec::new();
        if let Some(key) = deep_str(&payload, "query.key").filter(|k| !k.is_empty()) {
            let query_string = fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            resolved_url = format!("{}/search/{}?{}", self.base_url, key, query_string);
            if let Some(hash) = deep_str(&payload, "query.hash") {
                domains = self.domains(&hash).await;
            }
        }

        Ok(TinEyeResponse::parse(&payload, &resolved_url)?.with_context(resp.status, domains, 1))
    }

    async fn navigate(&self, current: &TinEyeResponse, offset: i64) -> Option<TinEyeResponse> {
        let target = current.page_offset(offset)?;
        let url = page_api_url(&current.url, target)?;

        let fetched = match self.fetcher.get("tineye page", &url, &[], &[]).await {
            Ok(resp) => resp
                .json("tineye page")
                .and_then(|payload| TinEyeResponse::parse(&payload, &resp.url))
                .map(|page| page.with_context(resp.status, current.domains.clone(), target)),
            Err(e) => Err(e),
        };
        fetched
            .inspect_err(|e| tracing::warn!(page = target, error = %e, "tineye page fetch failed"))
            .ok()
    }

    /// 上一頁；已是第一頁時回傳 None
    pub async fn pre_page(&self, current: &TinEyeResponse) -> Option<TinEyeResponse> {
        self.navigate(current, -1).await
    }

    /// 下一頁；已是最後一頁時回傳 None
    pub async fn next_page(&self, current: &TinEyeResponse) -> Option<TinEyeResponse> {
        self.navigate(current, 1).await
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for TinEyeService {
    fn kind(&self) -> EngineKind {
        EngineKind::TinEye
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(TinEyeService::search(self, input).await?.into())
    }
}
