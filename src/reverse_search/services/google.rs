use super::{file_part, trim_base};
use crate::error::{EngineError, Result};
use crate::fetcher::{HttpFetcher, Params, RequestBody, Resp};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::GoogleLensResponse;
use crate::reverse_search::parsers::google::LensPage;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::{SearchParameters, SearchResponse, decode_params};
use crate::reverse_search::utils::select_first;
use crate::types::{EngineKind, ImageInput, ImageSource, SearchType};
use scraper::Html;
use serde::Deserialize;

/// Google Lens 參數
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleLensParams {
    pub search_type: SearchType,
    /// 介面語言
    pub hl: String,
    pub country: String,
    /// 附加文字查詢（exact_matches 不可用）
    pub q: Option<String>,
    pub max_results: i64,
}

impl Default for GoogleLensParams {
    fn default() -> Self {
        Self {
            search_type: SearchType::ExactMatches,
            hl: "en".to_string(),
            country: "HK".to_string(),
            q: None,
            max_results: 50,
        }
    }
}

pub struct GoogleLensService {
    fetcher: HttpFetcher,
    base_url: String,
    search_url: String,
    search_type: SearchType,
    hl_param: String,
    q: Option<String>,
    max_results: usize,
}

impl GoogleLensService {
    pub const BASE_URL: &'static str = "https://lens.google.com";
    pub const SEARCH_URL: &'static str = "https://www.google.com";

    /// 參數組合不合法時直接回傳 `InvalidInput`
    pub fn new(fetcher: HttpFetcher, params: GoogleLensParams) -> Result<Self> {
        let q = params.q.filter(|q| !q.trim().is_empty());
        if params.search_type == SearchType::ExactMatches && q.is_some() {
            return Err(EngineError::invalid_input(
                "query parameter 'q' is not applicable for 'exact_matches' search_type",
            ));
        }
        if params.max_results <= 0 {
            return Err(EngineError::invalid_input("max_results must be a positive integer"));
        }

        Ok(Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
            search_url: Self::SEARCH_URL.to_string(),
            search_type: params.search_type,
            hl_param: format!("{}-{}", params.hl, params.country.to_uppercase()),
            q,
            max_results: params.max_results as usize,
        })
    }

    pub fn from_parameters(fetcher: HttpFetcher, params: &SearchParameters) -> Result<Self> {
        Self::new(fetcher, decode_params(EngineKind::Google, params)?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    /// 子分頁連結的網域（預設 www.google.com）
    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = trim_base(search_url);
        self
    }

    fn query(&self) -> Params {
        let mut query = vec![("hl".to_string(), self.hl_param.clone())];
        if let Some(q) = self.q.as_ref().filter(|_| self.search_type != SearchType::ExactMatches) {
            query.push(("q".to_string(), q.clone()));
        }
        query
    }

    /// 結果頁中指向指定子分頁的連結
    fn sub_search_link(&self, html: &str) -> Option<String> {
        let code = self.search_type.udm_code()?;
        let document = Html::parse_document(html);
        select_first(document.root_element(), &format!(r#"a[href*="udm={}"]"#, code))
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }

    async fn upload(&self, source: ImageSource<'_>) -> Result<Resp> {
        let mut query = self.query();
        match source {
            ImageSource::File(file) => {
                let part = file_part("encoded_image", file).await?.mime("image/jpeg");
                self.fetcher
                    .post(
                        "google lens upload",
                        &format!("{}/v3/upload", self.base_url),
                        &query,
                        &[],
                        RequestBody::Multipart {
                            fields: Vec::new(),
                            files: vec![part],
                        },
                    )
                    .await
            }
            ImageSource::Url(url) => {
                query.push(("url".to_string(), url.to_string()));
                let endpoint = format!("{}/uploadbyurl", self.base_url);
                self.fetcher
                    .get("google lens upload", &endpoint, &query, &[])
                    .await
            }
        }
    }

    pub async fn search(&self, input: &ImageInput) -> Result<GoogleLensResponse> {
        let source = input.source()?;
        let mut resp = self.upload(source).await?;

        if let Some(link) = self.sub_search_link(&resp.text) {
            let target = format!("{}{}", self.search_url, link);
            match self.fetcher.get("google lens sub search", &target, &[], &[]).await {
                Ok(sub) => resp = sub,
                Err(e) => {
                    tracing::warn!(error = %e, "google lens sub search failed, using first page")
                }
            }
        }

        let page = LensPage {
            html: resp.text,
            search_type: self.search_type,
            max_results: self.max_results,
        };
        GoogleLensResponse::parse(&page, &resp.url)
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for GoogleLensService {
    fn kind(&self) -> EngineKind {
        EngineKind::Google
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(GoogleLensService::search(self, input).await?.into())
    }
}
