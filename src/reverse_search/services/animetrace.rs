use super::{file_part, trim_base};
use crate::error::Result;
use crate::fetcher::{HttpFetcher, RequestBody};
use crate::parser::ResponseParser;
use crate::reverse_search::parsers::AnimeTraceResponse;
use crate::reverse_search::trait_def::ReverseSearchService;
use crate::reverse_search::types::{SearchParameters, SearchResponse, decode_params};
use crate::types::{EngineKind, ImageInput, ImageSource};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Map, Value, json};

/// AnimeTrace 參數
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnimeTraceParams {
    /// 1 = 辨識多個角色
    pub is_multi: Option<u8>,
    /// 1 = 同時偵測 AI 生成
    pub ai_detect: Option<u8>,
    pub model: Option<String>,
    /// 本地檔案改以 base64 JSON 送出
    pub base64: bool,
}

impl AnimeTraceParams {
    fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(is_multi) = self.is_multi.filter(|v| *v != 0) {
            fields.insert("is_multi".into(), json!(is_multi));
        }
        if let Some(ai_detect) = self.ai_detect.filter(|v| *v != 0) {
            fields.insert("ai_detect".into(), json!(ai_detect));
        }
        if let Some(model) = self.model.as_deref().filter(|m| !m.is_empty()) {
            fields.insert("model".into(), json!(model));
        }
        fields
    }
}

pub struct AnimeTraceService {
    fetcher: HttpFetcher,
    base_url: String,
    params: AnimeTraceParams,
}

impl AnimeTraceService {
    pub const BASE_URL: &'static str = "https://api.animetrace.com";

    pub fn new(fetcher: HttpFetcher, params: AnimeTraceParams) -> Self {
        Self {
            fetcher,
            base_url: Self::BASE_URL.to_string(),
            params,
        }
    }

    pub fn from_parameters(fetcher: HttpFetcher, params: &SearchParameters) -> Result<Self> {
        Ok(Self::new(fetcher, decode_params(EngineKind::AnimeTrace, params)?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = trim_base(base_url);
        self
    }

    pub async fn search(&self, input: &ImageInput) -> Result<AnimeTraceResponse> {
        let source = input.source()?;
        let endpoint = format!("{}/v1/search", self.base_url);
        let fields = self.params.fields();

        let body = match source {
            ImageSource::Url(url) => {
                let mut data = fields;
                data.insert("url".into(), json!(url));
                RequestBody::Json(Value::Object(data))
            }
            ImageSource::File(file) if self.params.base64 => {
                let mut data = fields;
                data.insert("base64".into(), json!(STANDARD.encode(file.read().await?)));
                RequestBody::Json(Value::Object(data))
            }
            ImageSource::File(file) => RequestBody::Multipart {
                fields: fields
                    .into_iter()
                    .map(|(k, v)| {
                        let text = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                        (k, text)
                    })
                    .collect(),
                files: vec![file_part("file", file).await?],
            },
        };

        let resp = self
            .fetcher
            .post("animetrace search", &endpoint, &[], &[], body)
            .await?;
        AnimeTraceResponse::parse(&resp.json("animetrace search")?, &resp.url)
    }
}

#[async_trait::async_trait]
impl ReverseSearchService for AnimeTraceService {
    fn kind(&self) -> EngineKind {
        EngineKind::AnimeTrace
    }

    async fn search(&self, input: &ImageInput) -> Result<SearchResponse> {
        Ok(AnimeTraceService::search(self, input).await?.into())
    }
}
