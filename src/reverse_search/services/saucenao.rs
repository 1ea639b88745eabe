use super::{file_part, trim_base};
use crate::error::{EngineError, Result};
use crate::fetcher::{HttpFetcher, Params, RequestBody};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::SauceNaoResponse;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::{SearchParameters, SearchResponse, decode_params};
use crate::types::{EngineKind, ImageInput, ImageSource};
use serde::Deserialize;

/// SauceNAO 參數
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SauceNaoParams {
    pub api_key: Option<String>,
    /// 0 不隱藏 … 3 隱藏所有成人內容
    pub hide: u32,
    pub numres: u32,
    pub minsim: u32,
    /// 2 = JSON
    pub output_type: u32,
    pub testmode: u32,
    pub db: u32,
    /// 有設定時取代 `db`
    pub dbs: Option<Vec<u32>>,
    pub dbmask: Option<u64>,
    pub dbmaski: Option<u64>,
}

impl Default for SauceNaoParams {
    fn default() -> Self {
        Self {
            api_key: None,
            hide: 3,
            numres: 5,
            minsim: 30,
            output_type: 2,
            testmode: 0,
            db: 999,
            dbs: None,
            dbmask: None,
            dbmaski: None,
        }
    }
}

impl SauceNaoParams {
    fn query(&self) -> Params {
        let mut query: Params = vec![
            ("testmode".into(), self.testmode.to_string()),
            ("numres".into(), self.numres.to_string()),
            ("output_type".into(), self.output_type.to_string()),
            ("hide".into(), self.hide.to_string()),
        ];
        match &self.dbs {
            Some(dbs) => query.extend(dbs.iter().map(|db| ("dbs[]".to_string(), db.to_string()))),
            None => query.push(("db".into(), self.db.to_string())),
        }
        query.push(("minsim".into(), self.minsim.to_string()));
        if let Some(api_key) = &self.api_key {
            query.push(("api_key".into(), api_key.clone()));
        }
        if let Some(dbmask) = self.dbmask {
            query.push(("dbmask".into(), dbmask.to_string()));
        }
        if let Some(dbmaski) = self.dbmaski {
            query.push(("dbmaski".into(), dbmaski.to_string()));
        }
        query
    }
}

pub struct SauceNaoService {
    fetcher: HttpFetcher,
    base_url: String,
    params: SauceNaoParams,
}

impl SauceNaoService {
    pub const BASE_URL: &'static str = "https://saucenao.com";

    pub fn new(fetcher: HttpFetcher, params: SauceNaoParams) -> Result<Self> {
        if params.api_key.as_deref().is_none_or(|key| key.trim().is_empty()) {
            return Err(EngineError::invalid_input("saucenao 需要 api_key"));
        }
        Ok(Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
            params,
        })
    }

    pub fn from_parameters(fetcher: HttpFetcher, params: &SearchParameters) -> Result<Self> {
        Self::new(fetcher, decode_params(EngineKind::SauceNao, params)?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    pub async fn search(&self, input: &ImageInput) -> Result<SauceNaoResponse> {
        let source = input.source()?;
        let endpoint = format!("{}/search.php", self.base_url);
        let mut query = self.params.query();

        let body = match source {
            ImageSource::Url(url) => {
                query.push(("url".into(), url.to_string()));
                RequestBody::Empty
            }
            ImageSource::File(file) => RequestBody::Multipart {
                fields: Vec::new(),
                files: vec![file_part("file", file).await?],
            },
        };

        let resp = self
            .fetcher
            .post("saucenao search", &endpoint, &query, &[], body)
            .await?;
        let payload = resp.json("saucenao search")?;
        Ok(SauceNaoResponse::parse(&payload, &resp.url)?.with_status(resp.status))
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for SauceNaoService {
    fn kind(&self) -> EngineKind {
        EngineKind::SauceNao
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(SauceNaoService::search(self, input).await?.into())
    }
}
