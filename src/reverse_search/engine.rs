use super::services::{
    AnimeTraceService, BaiDuService, BingService, CopyseekerService, EHentaiService,
    GoogleLensService, SauceNaoService, TinEyeService,
};
use super::trait_def::{EngineResponse, ReverseSearchService};
use super::types::{SearchParameters, SearchResponse};
use crate::config::SearchConfig;
use crate::error::{EngineError, ErrorKind, Result};
use crate::fetcher::HttpFetcher;
use crate::preprocess;
use crate::types::{EngineKind, ImageInput};
use std::collections::HashMap;
use std::sync::Arc;

/// 依名稱選擇引擎、合併參數並執行單次搜尋
pub struct ReverseSearchEngine {
    config: Arc<SearchConfig>,
    /// 呼叫端提供的 client（共用 session）
    client: Option<reqwest::Client>,
    base_urls: HashMap<EngineKind, String>,
}

impl ReverseSearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: None,
            base_urls: HashMap::new(),
        }
    }

    /// 所有搜尋共用呼叫端的 client（cookie 不再隔離）
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// 覆寫某個引擎的服務位址
    pub fn with_base_url(mut self, engine: EngineKind, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(engine, base_url.into());
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn supported_engines() -> Vec<&'static str> {
        EngineKind::ALL.iter().map(EngineKind::as_str).collect()
    }

    fn fetcher_for(&self, engine: EngineKind) -> Result<HttpFetcher> {
        match &self.client {
            Some(client) => Ok(HttpFetcher::from_client(client.clone())),
            None => HttpFetcher::new(&self.config.transport_options(engine.as_str())),
        }
    }

    fn build_service(
        &self,
        engine: EngineKind,
        fetcher: HttpFetcher,
        params: &SearchParameters,
    ) -> Result<Box<dyn ReverseSearchService>> {
        let base_url = self.base_urls.get(&engine).cloned();

        macro_rules! boxed {
            ($service:expr) => {{
                let service = $service;
                match base_url {
                    Some(url) => {
                        Box::new(service.with_base_url(url)) as Box<dyn ReverseSearchService>
                    }
                    None => Box::new(service),
                }
            }};
        }

        Ok(match engine {
            EngineKind::AnimeTrace => boxed!(AnimeTraceService::from_parameters(fetcher, params)?),
            EngineKind::BaiDu => boxed!(BaiDuService::new(fetcher)),
            EngineKind::Bing => boxed!(BingService::new(fetcher)),
            EngineKind::Copyseeker => boxed!(CopyseekerService::new(fetcher)),
            EngineKind::EHentai => boxed!(EHentaiService::from_parameters(fetcher, params)?),
            EngineKind::Google => boxed!(GoogleLensService::from_parameters(fetcher, params)?),
            EngineKind::SauceNao => boxed!(SauceNaoService::from_parameters(fetcher, params)?),
            EngineKind::TinEye => boxed!(TinEyeService::from_parameters(fetcher, params)?),
        })
    }

    /// 執行搜尋，回傳該引擎的結果
    pub async fn search(
        &self,
        engine: &str,
        mut input: ImageInput,
        params: &SearchParameters,
    ) -> Result<SearchResponse> {
        let engine: EngineKind = engine.parse()?;
        input.source()?;

        // GIF 只取第一幀
        if let Some(file) = input.file.take() {
            input.file = Some(preprocess::normalize_image(file).await?);
        }

        let params = self.config.merged_params(engine.as_str(), params);
        let service = self.build_service(engine, self.fetcher_for(engine)?, &params)?;

        tracing::info!(engine = %engine, by_url = input.url.is_some(), "searching");
        let response = service.search(&input).await?;
        tracing::info!(engine = %engine, items = response.items().len(), "search finished");
        Ok(response)
    }

    /// 搜尋並轉成文字；失敗時回傳格式化的錯誤區塊
    pub async fn search_text(
        &self,
        engine: &str,
        input: ImageInput,
        params: &SearchParameters,
    ) -> String {
        match self.search(engine, input, params).await {
            Ok(response) => response.show_result(),
            Err(e) => {
                tracing::warn!(engine, error = %e, "search failed");
                format_error(engine, &e)
            }
        }
    }

    pub async fn search_and_print(
        &self,
        engine: &str,
        input: ImageInput,
        params: &SearchParameters,
    ) {
        println!("{}", self.search_text(engine, input, params).await);
    }
}

/// 統一的錯誤輸出
pub fn format_error(engine: &str, error: &EngineError) -> String {
    let message = match error.kind() {
        ErrorKind::DiscoveryFailed => "未搜尋到相關資訊".to_string(),
        _ => error.to_string(),
    };
    let rule = "=".repeat(50);
    format!(
        "{rule}\n{} 搜尋失敗\n{rule}\n錯誤訊息: {}\n{rule}",
        engine.to_uppercase(),
        message
    )
}
