use crate::fetcher::TransportOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// 搜尋設定（整個 process 共用，建立後唯讀）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// 代理伺服器
    pub proxy: Option<String>,
    /// 單一 HTTP 請求超時（秒）
    pub timeout_secs: u64,
    /// 是否驗證 TLS 憑證
    pub verify_ssl: bool,
    /// 全域備用 cookie
    pub cookies: Option<String>,
    /// 各引擎的預設參數
    pub default_params: HashMap<String, Map<String, Value>>,
    /// 各引擎的預設 cookie（優先於 `cookies`）
    pub default_cookies: HashMap<String, String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout_secs: 60,
            verify_ssl: true,
            cookies: None,
            default_params: HashMap::new(),
            default_cookies: HashMap::new(),
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 TOML 檔案讀取
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("無法讀取設定檔: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("無法解析設定檔: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_cookies(mut self, cookies: impl Into<String>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    pub fn with_engine_params(mut self, engine: &str, params: Map<String, Value>) -> Self {
        self.default_params.insert(engine.to_string(), params);
        self
    }

    pub fn with_engine_cookies(mut self, engine: &str, cookies: impl Into<String>) -> Self {
        self.default_cookies.insert(engine.to_string(), cookies.into());
        self
    }

    /// 引擎專用 cookie，沒有則使用全域 cookie
    pub fn cookies_for(&self, engine: &str) -> Option<&str> {
        self.default_cookies
            .get(engine)
            .map(String::as_str)
            .or(self.cookies.as_deref())
            .filter(|c| !c.trim().is_empty())
    }

    /// 合併預設參數與呼叫時參數（呼叫時優先）
    pub fn merged_params(
        &self,
        engine: &str,
        call_params: &Map<String, Value>,
    ) -> Map<String, Value> {
        let mut merged = self.default_params.get(engine).cloned().unwrap_or_default();
        for (key, value) in call_params {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// 單次搜尋使用的傳輸設定
    pub fn transport_options(&self, engine: &str) -> TransportOptions {
        TransportOptions {
            proxy: self.proxy.clone().filter(|p| !p.is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
            verify_ssl: self.verify_ssl,
            cookies: self.cookies_for(engine).map(str::to_string),
            headers: Vec::new(),
        }
    }
}
