use super::parsers::{
    AnimeTraceResponse, BaiDuResponse, BingResponse, CopyseekerResponse, EHentaiResponse,
    GoogleLensResponse, SauceNaoResponse, TinEyeResponse,
};
use super::trait_def::EngineResponse;
use crate::error::{EngineError, Result};
use crate::types::{EngineKind, ResultItem};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// 呼叫端傳入的引擎參數（未知的 key 會被忽略）
pub type SearchParameters = Map<String, Value>;

/// 把參數表轉成引擎的參數結構
pub fn decode_params<T: DeserializeOwned>(
    engine: EngineKind,
    params: &SearchParameters,
) -> Result<T> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| EngineError::invalid_input(format!("{} 參數錯誤: {}", engine, e)))
}

/// 任一引擎的搜尋結果
#[derive(Debug, Clone)]
pub enum SearchResponse {
    AnimeTrace(AnimeTraceResponse),
    BaiDu(BaiDuResponse),
    Bing(BingResponse),
    Copyseeker(CopyseekerResponse),
    EHentai(EHentaiResponse),
    GoogleLens(GoogleLensResponse),
    SauceNao(SauceNaoResponse),
    TinEye(TinEyeResponse),
}

impl SearchResponse {
    pub fn kind(&self) -> EngineKind {
        match self {
            SearchResponse::AnimeTrace(_) => EngineKind::AnimeTrace,
            SearchResponse::BaiDu(_) => EngineKind::BaiDu,
            SearchResponse::Bing(_) => EngineKind::Bing,
            SearchResponse::Copyseeker(_) => EngineKind::Copyseeker,
            SearchResponse::EHentai(_) => EngineKind::EHentai,
            SearchResponse::GoogleLens(_) => EngineKind::Google,
            SearchResponse::SauceNao(_) => EngineKind::SauceNao,
            SearchResponse::TinEye(_) => EngineKind::TinEye,
        }
    }

    fn inner(&self) -> &dyn EngineResponse {
        match self {
            SearchResponse::AnimeTrace(r) => r,
            SearchResponse::BaiDu(r) => r,
            SearchResponse::Bing(r) => r,
            SearchResponse::Copyseeker(r) => r,
            SearchResponse::EHentai(r) => r,
            SearchResponse::GoogleLens(r) => r,
            SearchResponse::SauceNao(r) => r,
            SearchResponse::TinEye(r) => r,
        }
    }
}

impl EngineResponse for SearchResponse {
    fn url(&self) -> &str {
        self.inner().url()
    }

    fn items(&self) -> Vec<ResultItem> {
        self.inner().items()
    }

    fn show_result(&self) -> String {
        self.inner().show_result()
    }
}

macro_rules! impl_from_response {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SearchResponse {
                fn from(response: $ty) -> Self {
                    SearchResponse::$variant(response)
                }
            }
        )*
    };
}

impl_from_response! {
    AnimeTrace => AnimeTraceResponse,
    BaiDu => BaiDuResponse,
    Bing => BingResponse,
    Copyseeker => CopyseekerResponse,
    EHentai => EHentaiResponse,
    GoogleLens => GoogleLensResponse,
    SauceNao => SauceNaoResponse,
    TinEye => TinEyeResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Default)]
    #[serde(default)]
    struct Knobs {
        numres: u32,
        similar: bool,
    }

    #[test]
    fn test_decode_params_ignores_unknown_keys() {
        let params = json!({"numres": 3, "whatever": "x"}).as_object().cloned().unwrap();
        let knobs: Knobs = decode_params(EngineKind::SauceNao, &params).unwrap();
        assert_eq!(knobs.numres, 3);
        assert!(!knobs.similar);
    }

    #[test]
    fn test_decode_params_type_mismatch() {
        let params = json!({"numres": "many"}).as_object().cloned().unwrap();
        let err = decode_params::<Knobs>(EngineKind::SauceNao, &params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_delegates_to_engine_response() {
        let response: SearchResponse = BaiDuResponse::empty("https://graph.baidu.com/s").into();
        assert_eq!(response.kind(), EngineKind::BaiDu);
        assert_eq!(response.url(), "https://graph.baidu.com/s");
        assert!(response.is_empty());
        assert_eq!(response.show_result(), "無相關結果");
    }
}
