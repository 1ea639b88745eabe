use crate::error::{EngineError, Result};
use crate::parser::{ResponseParser, as_f64, as_u64, str_or_default, string_list, value_to_string};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::separator;
use crate::types::ResultItem;
use serde_json::Value;

/// 取出 server action 回應中第一個 `1:{...}` frame
pub fn first_frame(text: &str) -> Option<Value> {
    text.lines()
        .map(str::trim)
        .find(|line| line.starts_with("1:{"))
        .and_then(|line| serde_json::from_str(&line[2..]).ok())
}

/// 從上傳回應取出 discoveryId
pub fn discovery_id(text: &str) -> Option<String> {
    first_frame(text)
        .and_then(|frame| frame.get("discoveryId").and_then(value_to_string))
        .filter(|id| !id.is_empty())
}

#[derive(Debug, Clone, Default)]
pub struct CopyseekerItem {
    pub url: String,
    pub title: String,
    pub thumbnail: String,
    pub thumbnail_list: Vec<String>,
    pub website_rank: f64,
}

impl CopyseekerItem {
    fn from_value(raw: &Value) -> Self {
        Self {
            url: str_or_default(raw, "url"),
            title: str_or_default(raw, "title"),
            thumbnail: str_or_default(raw, "mainImage"),
            thumbnail_list: string_list(raw, "otherImages"),
            website_rank: raw.get("rank").and_then(as_f64).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CopyseekerResponse {
    pub origin: Value,
    pub url: String,
    pub id: String,
    pub image_url: String,
    pub best_guess_label: Option<String>,
    pub entities: Option<String>,
    pub total: u64,
    pub exif: Value,
    pub raw: Vec<CopyseekerItem>,
    pub similar_image_urls: Vec<String>,
}

impl CopyseekerResponse {
    /// 沒有取得 discoveryId 時的空回應
    pub fn empty(url: &str) -> Self {
        Self {
            origin: Value::Object(Default::default()),
            url: url.to_string(),
            exif: Value::Object(Default::default()),
            ..Self::default()
        }
    }
}

impl ResponseParser for CopyseekerResponse {
    type Payload = Value;

    fn parse(payload: &Value, resp_url: &str) -> Result<Self> {
        let required = |key: &str| {
            payload
                .get(key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| {
                    EngineError::malformed("copyseeker parse", format!("missing {}", key))
                })
        };

        let id = required("id").map(|v| value_to_string(v).unwrap_or_default())?;
        let image_url = required("imageUrl").map(|v| value_to_string(v).unwrap_or_default())?;
        let total = required("totalLinksFound").map(|v| as_u64(v).unwrap_or(0))?;

        let raw = payload
            .get("pages")
            .and_then(|p| p.as_array())
            .map(|pages| pages.iter().map(CopyseekerItem::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            origin: payload.clone(),
            url: resp_url.to_string(),
            id,
            image_url,
            best_guess_label: payload.get("bestGuessLabel").and_then(value_to_string),
            entities: payload.get("entities").and_then(value_to_string),
            total,
            exif: payload
                .get("exif")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
            raw,
            similar_image_urls: string_list(payload, "visuallySimilarImages"),
        })
    }
}

impl EngineResponse for CopyseekerResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        self.raw
            .iter()
            .map(|item| ResultItem {
                title: item.title.clone(),
                url: item.url.clone(),
                thumbnail: item.thumbnail.clone(),
                similarity: None,
                extras: vec![("rank".to_string(), item.website_rank.to_string())],
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let mut lines = vec![match self.raw.first() {
            Some(first) => format!("匹配圖源：{}", first.url),
            None => "匹配圖源：無".to_string(),
        }];
        lines.push("相似圖片：".to_string());
        for (i, url) in self.similar_image_urls.iter().enumerate() {
            lines.push(format!("  #{} {}", i + 1, url));
            lines.push(separator());
        }
        lines.join("\n")
    }
}
