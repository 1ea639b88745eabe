use crate::error::{EngineError, Result};
use crate::parser::{ResponseParser, as_i64, as_u64, deep_str, str_or_default};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::separator;
use crate::types::{DomainInfo, ResultItem};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct TinEyeItem {
    pub thumbnail: String,
    pub image_url: String,
    pub url: String,
    pub domain: String,
    /// `[width, height]`
    pub size: [u64; 2],
    pub crawl_date: String,
}

impl TinEyeItem {
    fn from_value(raw: &Value) -> Self {
        let backlink = |field: &str| {
            deep_str(raw, &format!("backlinks[0].{}", field)).unwrap_or_default()
        };
        let dimension = |key: &str| raw.get(key).and_then(as_u64).unwrap_or(0);

        Self {
            thumbnail: str_or_default(raw, "image_url"),
            image_url: backlink("url"),
            url: backlink("backlink"),
            domain: str_or_default(raw, "domain"),
            size: [dimension("width"), dimension("height")],
            crawl_date: backlink("crawl_date"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TinEyeResponse {
    pub origin: Value,
    pub url: String,
    pub query_hash: String,
    pub status_code: u16,
    pub total_pages: u32,
    pub page_number: u32,
    pub domains: Vec<DomainInfo>,
    pub raw: Vec<TinEyeItem>,
}

impl TinEyeResponse {
    /// 補上傳輸層與分頁資訊
    pub fn with_context(
        mut self,
        status_code: u16,
        domains: Vec<DomainInfo>,
        page_number: u32,
    ) -> Self {
        self.status_code = status_code;
        self.domains = domains;
        self.page_number = page_number;
        self
    }

    /// 相對於目前頁的目標頁碼，超出範圍回傳 None
    pub fn page_offset(&self, offset: i64) -> Option<u32> {
        let target = i64::from(self.page_number) + offset;
        (1..=i64::from(self.total_pages))
            .contains(&target)
            .then_some(target as u32)
    }
}

impl ResponseParser for TinEyeResponse {
    type Payload = Value;

    fn parse(payload: &Value, resp_url: &str) -> Result<Self> {
        let total_pages = payload
            .get("total_pages")
            .and_then(as_i64)
            .ok_or_else(|| EngineError::malformed("tineye parse", "missing total_pages"))?;

        // null 視為沒有結果，缺少欄位則是格式錯誤
        let raw = match payload.get("matches") {
            Some(Value::Array(matches)) => matches.iter().map(TinEyeItem::from_value).collect(),
            Some(Value::Null) => Vec::new(),
            _ => return Err(EngineError::malformed("tineye parse", "missing matches")),
        };

        let query_hash = payload
            .get("query_hash")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| deep_str(payload, "query.hash"))
            .unwrap_or_default();

        Ok(Self {
            origin: payload.clone(),
            url: resp_url.to_string(),
            query_hash,
            status_code: 200,
            total_pages: total_pages.max(0) as u32,
            page_number: 1,
            domains: Vec::new(),
            raw,
        })
    }
}

impl EngineResponse for TinEyeResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        self.raw
            .iter()
            .map(|item| ResultItem {
                title: item.domain.clone(),
                url: item.url.clone(),
                thumbnail: item.thumbnail.clone(),
                similarity: None,
                extras: vec![
                    ("image_url".to_string(), item.image_url.clone()),
                    ("size".to_string(), format!("{}x{}", item.size[0], item.size[1])),
                    ("crawl_date".to_string(), item.crawl_date.clone()),
                ],
            })
            .collect()
    }

    fn show_result(&self) -> String {
        if self.raw.is_empty() {
            return "未找到匹配結果".to_string();
        }
        let mut lines = Vec::new();
        for (i, item) in self.raw.iter().enumerate() {
            lines.push(separator());
            lines.push(format!("結果 #{}", i + 1));
            lines.push(format!("原圖連結: {}", item.image_url));
            lines.push(format!("來源網頁: {}", item.url));
        }
        lines.push(separator());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "query_hash": "h123",
            "total_pages": 3,
            "matches": [{
                "image_url": "https://img.tineye.com/result/1.jpg",
                "domain": "example.com",
                "width": 800,
                "height": 600,
                "backlinks": [{
                    "url": "https://example.com/full.jpg",
                    "backlink": "https://example.com/page",
                    "crawl_date": "2021-05-01"
                }]
            }]
        })
    }

    #[test]
    fn test_parse_matches() {
        let resp =
            TinEyeResponse::parse(&sample(), "https://tineye.com/search/key?page=1").unwrap();
        assert_eq!(resp.query_hash, "h123");
        assert_eq!(resp.total_pages, 3);
        let item = &resp.raw[0];
        assert_eq!(item.size, [800, 600]);
        assert_eq!(item.url, "https://example.com/page");
        assert_eq!(item.crawl_date, "2021-05-01");

        let text = resp.show_result();
        assert!(text.contains("原圖連結: https://example.com/full.jpg"));
        assert!(text.ends_with(&separator()));
    }

    #[test]
    fn test_missing_total_pages() {
        let err = TinEyeResponse::parse(&json!({"matches": []}), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_missing_matches() {
        let err = TinEyeResponse::parse(&json!({"total_pages": 1}), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        let resp = TinEyeResponse::parse(&json!({"total_pages": 1, "matches": null}), "").unwrap();
        assert!(resp.raw.is_empty());
    }

    #[test]
    fn test_page_offset_bounds() {
        let resp = TinEyeResponse::parse(&sample(), "").unwrap();
        assert_eq!(resp.page_offset(-1), None);
        assert_eq!(resp.page_offset(1), Some(2));

        let last = resp.with_context(200, Vec::new(), 3);
        assert_eq!(last.page_offset(1), None);
        assert_eq!(last.page_offset(-1), Some(2));
    }
}
