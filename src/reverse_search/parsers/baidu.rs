use crate::error::Result;
use crate::parser::{ResponseParser, deep_get, deep_str, first_present};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::{script_texts, separator};
use crate::types::ResultItem;
use scraper::Html;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct BaiDuItem {
    pub title: String,
    pub thumbnail: String,
    pub url: String,
}

impl BaiDuItem {
    pub fn from_value(raw: &Value) -> Self {
        Self {
            title: deep_str(raw, "title[0]").unwrap_or_default(),
            thumbnail: first_present(raw, &["image_src", "thumbUrl"]).unwrap_or_default(),
            url: first_present(raw, &["url", "fromUrl"]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BaiDuResponse {
    pub origin: Value,
    pub url: String,
    /// 相似圖片
    pub raw: Vec<BaiDuItem>,
    /// 相同圖片
    pub exact_matches: Vec<BaiDuItem>,
}

impl BaiDuResponse {
    /// 沒有任何結果
    pub fn empty(url: &str) -> Self {
        Self {
            origin: Value::Object(Default::default()),
            url: url.to_string(),
            ..Self::default()
        }
    }
}

impl ResponseParser for BaiDuResponse {
    type Payload = Value;

    fn parse(payload: &Value, resp_url: &str) -> Result<Self> {
        let exact_matches = deep_get(payload, "same.list")
            .and_then(|list| list.as_array())
            .map(|list| {
                list.iter()
                    .filter(|entry| entry.get("url").is_some() && entry.get("image_src").is_some())
                    .map(BaiDuItem::from_value)
                    .collect()
            })
            .unwrap_or_default();

        let raw = deep_get(payload, "data.list")
            .and_then(|list| list.as_array())
            .map(|list| list.iter().map(BaiDuItem::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            origin: payload.clone(),
            url: resp_url.to_string(),
            raw,
            exact_matches,
        })
    }
}

impl EngineResponse for BaiDuResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        let to_item = |kind: &str, item: &BaiDuItem| ResultItem {
            title: item.title.clone(),
            url: item.url.clone(),
            thumbnail: item.thumbnail.clone(),
            similarity: None,
            extras: vec![("match".to_string(), kind.to_string())],
        };
        self.exact_matches
            .iter()
            .map(|item| to_item("same", item))
            .chain(self.raw.iter().map(|item| to_item("similar", item)))
            .collect()
    }

    fn show_result(&self) -> String {
        let mut lines = Vec::new();
        if !self.exact_matches.is_empty() {
            lines.extend(["最佳結果:".to_string(), separator()]);
            for (i, item) in self.exact_matches.iter().enumerate() {
                lines.push(format!("結果 #{}", i + 1));
                lines.push(format!("標題: {}", item.title));
                lines.push(format!("連結: {}", item.url));
                lines.push(separator());
            }
        }
        if self.raw.is_empty() {
            lines.push("無相關結果".to_string());
        } else {
            lines.extend(["相關結果:".to_string(), separator()]);
            for (i, item) in self.raw.iter().enumerate() {
                lines.push(format!("結果 #{}", i + 1));
                lines.push(format!("連結: {}", item.url));
                lines.push(separator());
            }
        }
        lines.join("\n")
    }
}

/// 從結果頁中取出 `window.cardData` 陣列
///
/// 找不到或不是合法 JSON 時回傳空陣列。
pub fn extract_card_data(html: &str) -> Vec<Value> {
    let document = Html::parse_document(html);
    script_texts(&document, "script")
        .into_iter()
        .find(|text| text.contains("window.cardData"))
        .and_then(|text| {
            let start = text.find('[')?;
            let end = text.rfind(']')?;
            if end < start {
                return None;
            }
            serde_json::from_str::<Vec<Value>>(&text[start..=end]).ok()
        })
        .unwrap_or_default()
}

/// 卡片掃描結果
#[derive(Debug, Clone, PartialEq)]
pub enum CardScan {
    /// 明確標示沒有結果
    NoResult,
    /// 需要再抓一次相似圖片清單
    Similar { first_url: String, same: Option<Value> },
    /// 沒有可用的卡片
    Nothing,
}

/// 依序掃描卡片：`noresult` 立即結束，`same` 暫存，`simipic` 帶出下一步 URL
pub fn scan_cards(cards: &[Value]) -> CardScan {
    let mut same = None;
    for card in cards {
        match card.get("cardName").and_then(|n| n.as_str()) {
            Some("noresult") => return CardScan::NoResult,
            Some("same") => same = card.get("tplData").cloned(),
            Some("simipic") => {
                if let Some(first_url) = deep_str(card, "tplData.firstUrl") {
                    return CardScan::Similar { first_url, same };
                }
            }
            _ => {}
        }
    }
    CardScan::Nothing
}
