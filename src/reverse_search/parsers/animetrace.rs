use crate::error::{EngineError, Result};
use crate::parser::{ResponseParser, as_f64, as_i64, str_or_default, value_to_string};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::separator;
use crate::types::ResultItem;
use serde_json::Value;

/// 辨識出的角色
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub name: String,
    pub work: String,
}

/// 單一偵測框的辨識結果
#[derive(Debug, Clone, Default)]
pub struct AnimeTraceItem {
    pub bbox: Vec<f64>,
    pub box_id: String,
    pub characters: Vec<Character>,
}

impl AnimeTraceItem {
    pub fn from_value(raw: &Value) -> Self {
        let bbox = raw
            .get("box")
            .and_then(|b| b.as_array())
            .map(|coords| coords.iter().filter_map(as_f64).collect())
            .unwrap_or_default();

        let characters = raw
            .get("character")
            .and_then(|c| c.as_array())
            .map(|list| {
                list.iter()
                    .map(|c| Character {
                        name: str_or_default(c, "character"),
                        work: str_or_default(c, "work"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bbox,
            box_id: str_or_default(raw, "box_id"),
            characters,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnimeTraceResponse {
    pub origin: Value,
    pub url: String,
    pub code: i64,
    /// 是否判定為 AI 生成
    pub ai: bool,
    pub trace_id: Option<String>,
    pub raw: Vec<AnimeTraceItem>,
}

impl ResponseParser for AnimeTraceResponse {
    type Payload = Value;

    fn parse(payload: &Value, resp_url: &str) -> Result<Self> {
        let code = payload
            .get("code")
            .and_then(as_i64)
            .ok_or_else(|| EngineError::malformed("animetrace parse", "missing code"))?;
        let data = payload
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| EngineError::malformed("animetrace parse", "missing data"))?;

        Ok(Self {
            origin: payload.clone(),
            url: resp_url.to_string(),
            code,
            ai: payload.get("ai").and_then(|v| v.as_bool()).unwrap_or(false),
            trace_id: payload.get("trace_id").and_then(value_to_string),
            raw: data.iter().map(AnimeTraceItem::from_value).collect(),
        })
    }
}

impl EngineResponse for AnimeTraceResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        self.raw
            .iter()
            .flat_map(|item| {
                item.characters.iter().map(move |c| ResultItem {
                    title: c.name.clone(),
                    extras: vec![
                        ("work".to_string(), c.work.clone()),
                        ("box_id".to_string(), item.box_id.clone()),
                    ],
                    ..ResultItem::default()
                })
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let mut lines = vec![
            format!("是否為 AI 生成: {}", if self.ai { "是" } else { "否" }),
            separator(),
        ];
        // 每個偵測框各自編號
        for item in &self.raw {
            for (i, character) in item.characters.iter().enumerate() {
                lines.push(format!("結果 #{}", i + 1));
                lines.push(format!("作品名: {}", character.work));
                lines.push(format!("角色名: {}", character.name));
                lines.push(separator());
            }
        }
        lines.join("\n")
    }
}
