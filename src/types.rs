use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 本地圖片內容
#[derive(Debug, Clone)]
pub enum ImageFile {
    /// 原始位元組
    Bytes(Vec<u8>),
    /// 本地路徑
    Path(PathBuf),
}

impl ImageFile {
    /// 讀取圖片位元組
    pub async fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            ImageFile::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
            ImageFile::Path(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(|e| {
                    let message = format!("無法讀取檔案 {}: {}", path.display(), e);
                    EngineError::invalid_input(message)
                }),
        }
    }

    /// 上傳時使用的檔名
    pub fn file_name(&self) -> String {
        match self {
            ImageFile::Bytes(_) => "image.jpg".to_string(),
            ImageFile::Path(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image.jpg".to_string()),
        }
    }
}

impl From<Vec<u8>> for ImageFile {
    fn from(bytes: Vec<u8>) -> Self {
        ImageFile::Bytes(bytes)
    }
}

impl From<PathBuf> for ImageFile {
    fn from(path: PathBuf) -> Self {
        ImageFile::Path(path)
    }
}

impl From<&Path> for ImageFile {
    fn from(path: &Path) -> Self {
        ImageFile::Path(path.to_path_buf())
    }
}

/// 呼叫端傳入的搜尋圖片（url 與 file 只能擇一）
#[derive(Debug, Clone, Default)]
pub struct ImageInput {
    pub url: Option<String>,
    pub file: Option<ImageFile>,
}

impl ImageInput {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            file: None,
        }
    }

    pub fn from_file(file: impl Into<ImageFile>) -> Self {
        Self {
            url: None,
            file: Some(file.into()),
        }
    }

    /// 驗證輸入，所有引擎共用
    pub fn source(&self) -> Result<ImageSource<'_>> {
        let url = self.url.as_deref().filter(|u| !u.trim().is_empty());
        match (url, &self.file) {
            (Some(_), Some(_)) => Err(EngineError::invalid_input(
                "url and file cannot both be provided",
            )),
            (Some(url), None) => Ok(ImageSource::Url(url)),
            (None, Some(file)) => Ok(ImageSource::File(file)),
            (None, None) => Err(EngineError::invalid_input(
                "either url or file must be provided",
            )),
        }
    }
}

/// 驗證後的圖片來源
#[derive(Debug, Clone, Copy)]
pub enum ImageSource<'a> {
    Url(&'a str),
    File(&'a ImageFile),
}

/// 支援的搜尋引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    AnimeTrace,
    BaiDu,
    Bing,
    Copyseeker,
    EHentai,
    Google,
    SauceNao,
    TinEye,
}

impl EngineKind {
    pub const ALL: [EngineKind; 8] = [
        EngineKind::AnimeTrace,
        EngineKind::BaiDu,
        EngineKind::Bing,
        EngineKind::Copyseeker,
        EngineKind::EHentai,
        EngineKind::Google,
        EngineKind::SauceNao,
        EngineKind::TinEye,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::AnimeTrace => "animetrace",
            EngineKind::BaiDu => "baidu",
            EngineKind::Bing => "bing",
            EngineKind::Copyseeker => "copyseeker",
            EngineKind::EHentai => "ehentai",
            EngineKind::Google => "google",
            EngineKind::SauceNao => "saucenao",
            EngineKind::TinEye => "tineye",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        EngineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| {
                let available = EngineKind::ALL.map(|k| k.as_str()).join(", ");
                EngineError::UnsupportedEngine(format!("{} (supported: {})", s, available))
            })
    }
}

/// 正規化後的單筆結果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    /// 0-100
    pub similarity: Option<f64>,
    /// 各引擎特有欄位
    pub extras: Vec<(String, String)>,
}

/// Google Lens 搜尋類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    All,
    Products,
    VisualMatches,
    #[default]
    ExactMatches,
}

impl SearchType {
    /// 結果頁子分頁的 udm 代碼
    pub fn udm_code(&self) -> Option<&'static str> {
        match self {
            SearchType::All => None,
            SearchType::Products => Some("37"),
            SearchType::VisualMatches => Some("44"),
            SearchType::ExactMatches => Some("48"),
        }
    }
}

/// TinEye 網域標籤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainTag {
    Stock,
    Collection,
}

impl FromStr for DomainTag {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "stock" => Ok(DomainTag::Stock),
            "collection" => Ok(DomainTag::Collection),
            _ => Err(()),
        }
    }
}

/// TinEye 網域統計
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainInfo {
    pub domain: String,
    pub count: u64,
    pub tag: Option<DomainTag>,
}

impl DomainInfo {
    /// 從 `[name, count, [tag]]` 格式建立
    pub fn from_raw(data: &serde_json::Value) -> Option<Self> {
        let domain = match data.get(0)? {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let count = crate::parser::as_u64(data.get(1)?)?;
        let tag = data
            .get(2)
            .and_then(|tags| tags.get(0))
            .and_then(|t| t.as_str())
            .and_then(|t| t.parse().ok());
        Some(Self { domain, count, tag })
    }
}
