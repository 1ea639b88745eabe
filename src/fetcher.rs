use crate::error::{EngineError, Result};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/99.0.4844.82 Safari/537.36";

/// 查詢參數
pub type Params = Vec<(String, String)>;

/// HTTP 回應的精簡表示
#[derive(Debug, Clone)]
pub struct Resp {
    pub text: String,
    /// 跟隨重新導向後的最終 URL
    pub url: String,
    pub status: u16,
}

impl Resp {
    /// 解析 JSON 回應
    pub fn json(&self, phase: &'static str) -> Result<Value> {
        serde_json::from_str(&self.text).map_err(|e| {
            EngineError::malformed(phase, format!("invalid JSON (status {}): {}", self.status, e))
        })
    }
}

/// multipart 中的檔案欄位
#[derive(Debug, Clone)]
pub struct FilePart {
    pub name: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// POST 請求的內容
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Text {
        content_type: String,
        body: String,
    },
    Json(Value),
    Form(Params),
    Multipart {
        fields: Params,
        files: Vec<FilePart>,
    },
}

/// 傳輸層設定
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub verify_ssl: bool,
    /// `k=v; k2=v2` 格式
    pub cookies: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Duration::from_secs(60),
            verify_ssl: true,
            cookies: None,
            headers: Vec::new(),
        }
    }
}

/// 單次搜尋專用的 cookie 容器，可整個清空
#[derive(Default)]
pub struct SessionCookies {
    jar: RwLock<Arc<Jar>>,
}

impl SessionCookies {
    fn current(&self) -> Arc<Jar> {
        let guard = self.jar.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn add(&self, cookie: &str, url: &Url) {
        self.current().add_cookie_str(cookie, url);
    }

    pub fn clear(&self) {
        let mut guard = self.jar.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(Jar::default());
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}

/// 解析 `k=v; k2=v2` cookie 字串
pub fn parse_cookie_string(cookies: &str) -> Vec<(String, String)> {
    cookies
        .split(';')
        .filter_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// HTTP 實作，所有引擎共用
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    session: Option<Arc<SessionCookies>>,
    cookies: Arc<Vec<(String, String)>>,
    seeded_hosts: Arc<Mutex<HashSet<String>>>,
}

impl HttpFetcher {
    /// 建立新的 HTTP Fetcher（自有 cookie jar）
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-TW,zh;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        for (key, value) in &options.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| EngineError::invalid_input(format!("header {}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| EngineError::invalid_input(format!("header {}: {}", key, e)))?;
            headers.insert(name, value);
        }

        let session = Arc::new(SessionCookies::default());
        let mut builder = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .cookie_provider(Arc::clone(&session))
            .danger_accept_invalid_certs(!options.verify_ssl);

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| EngineError::transport("proxy setup", e))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| EngineError::transport("client setup", e))?;

        Ok(Self {
            client,
            session: Some(session),
            cookies: Arc::new(
                options
                    .cookies
                    .as_deref()
                    .map(parse_cookie_string)
                    .unwrap_or_default(),
            ),
            seeded_hosts: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// 使用呼叫端提供的 client（由呼叫端管理 session）
    ///
    /// reqwest 不公開 client 內部的 cookie jar，因此 `clear_cookies`
    /// 在此模式下不做任何事，設定的 cookie 也不會寫入；需要時由呼叫端自行處理。
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            session: None,
            cookies: Arc::new(Vec::new()),
            seeded_hosts: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// 清空本次搜尋的 cookie（設定的 cookie 會在下次請求時重新寫入）
    pub fn clear_cookies(&self) {
        if let Some(session) = &self.session {
            session.clear();
            self.seeded_hosts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
        }
    }

    /// 第一次連到某個 host 時寫入設定的 cookie
    fn seed_cookies(&self, url: &str) {
        let Some(session) = &self.session else {
            return;
        };
        if self.cookies.is_empty() {
            return;
        }
        let Ok(parsed) = Url::parse(url) else {
            return;
        };
        let host = parsed.host_str().unwrap_or_default().to_string();
        let mut seeded = self.seeded_hosts.lock().unwrap_or_else(|e| e.into_inner());
        if !seeded.insert(host) {
            return;
        }
        for (key, value) in self.cookies.iter() {
            session.add(&format!("{}={}; Path=/", key, value), &parsed);
        }
    }

    /// GET 請求
    pub async fn get(
        &self,
        phase: &'static str,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<Resp> {
        self.seed_cookies(url);
        tracing::debug!(phase, url = %url, "GET");

        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::transport(phase, e))?;
        Self::into_resp(phase, response).await
    }

    /// POST 請求
    pub async fn post(
        &self,
        phase: &'static str,
        url: &str,
        query: &[(String, String)],
        headers: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<Resp> {
        self.seed_cookies(url);
        tracing::debug!(phase, url = %url, "POST");

        let mut request = self.client.post(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        for (key, value) in headers {
            request = request.header(*key, *value);
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Text { content_type, body } => request
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(body),
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Form(pairs) => request.form(&pairs),
            RequestBody::Multipart { fields, files } => {
                request.multipart(build_form(phase, fields, files)?)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::transport(phase, e))?;
        Self::into_resp(phase, response).await
    }

    /// 下載檔案（圖片可能在第三方網域，不寫入設定的 cookie）
    pub async fn download(&self, phase: &'static str, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(phase, url = %url, "download");

        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EngineError::transport(phase, e))?
            .bytes()
            .await
            .map_err(|e| EngineError::transport(phase, e))?;
        Ok(bytes.to_vec())
    }

    async fn into_resp(phase: &'static str, response: reqwest::Response) -> Result<Resp> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::transport(phase, e))?;
        tracing::debug!(phase, status, url = %url, bytes = text.len(), "response received");
        Ok(Resp { text, url, status })
    }
}

fn build_form(phase: &'static str, fields: Params, files: Vec<FilePart>) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for file in files {
        let mut part = Part::bytes(file.bytes);
        if let Some(file_name) = file.file_name {
            part = part.file_name(file_name);
        }
        if let Some(mime) = file.mime {
            part = part
                .mime_str(&mime)
                .map_err(|e| EngineError::transport(phase, e))?;
        }
        form = form.part(file.name, part);
    }
    Ok(form)
}

/// 把 `key => value` 組成查詢參數
pub fn params<K: ToString, V: ToString>(pairs: impl IntoIterator<Item = (K, V)>) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
