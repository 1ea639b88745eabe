use crate::error::{EngineError, Result};
use crate::parser::{
    ResponseParser, as_f64, as_i64, deep_get, first_present, str_or_default, string_list,
    value_to_string,
};
use crate::reverse_search::trait_def::EngineResponse;
use crate::types::ResultItem;
use serde_json::Value;

const TITLE_FIELDS: [&str; 6] = [
    "title",
    "material",
    "jp_name",
    "eng_name",
    "source",
    "created_at",
];

const AUTHOR_FIELDS: [&str; 9] = [
    "author",
    "member_name",
    "creator",
    "twitter_user_handle",
    "pawoo_user_display_name",
    "author_name",
    "user_name",
    "artist",
    "company",
];

/// SauceNAO 單筆結果
#[derive(Debug, Clone, Default)]
pub struct SauceNaoItem {
    pub similarity: f64,
    pub thumbnail: String,
    pub index_id: i64,
    pub index_name: String,
    pub hidden: i64,
    pub title: String,
    pub url: String,
    pub ext_urls: Vec<String>,
    pub author: String,
    pub author_url: String,
    pub source: String,
}

impl SauceNaoItem {
    pub fn from_value(raw: &Value) -> Self {
        let header = raw.get("header").unwrap_or(&Value::Null);
        let data = raw.get("data").unwrap_or(&Value::Null);

        Self {
            similarity: header.get("similarity").and_then(as_f64).unwrap_or(0.0),
            thumbnail: str_or_default(header, "thumbnail"),
            index_id: header.get("index_id").and_then(as_i64).unwrap_or(0),
            index_name: str_or_default(header, "index_name"),
            hidden: header.get("hidden").and_then(as_i64).unwrap_or(0),
            title: title_of(data),
            url: url_of(data),
            ext_urls: string_list(data, "ext_urls"),
            author: author_of(data),
            author_url: author_url_of(data),
            source: str_or_default(data, "source"),
        }
    }
}

/// 標題：依優先順序取第一個非空欄位
pub fn title_of(data: &Value) -> String {
    first_present(data, &TITLE_FIELDS).unwrap_or_default()
}

/// 作品連結：依來源 ID 組成
pub fn url_of(data: &Value) -> String {
    let id = |key: &str| data.get(key).and_then(value_to_string);

    if let Some(pixiv_id) = id("pixiv_id") {
        format!("https://www.pixiv.net/artworks/{}", pixiv_id)
    } else if let Some(pawoo_id) = id("pawoo_id") {
        format!(
            "https://pawoo.net/@{}/{}",
            id("pawoo_user_acct").unwrap_or_default(),
            pawoo_id
        )
    } else if let Some(getchu_id) = id("getchu_id") {
        format!("https://www.getchu.com/soft.phtml?id={}", getchu_id)
    } else {
        string_list(data, "ext_urls").into_iter().next().unwrap_or_default()
    }
}

/// 作者：creator 可能是陣列
pub fn author_of(data: &Value) -> String {
    for key in AUTHOR_FIELDS {
        match data.get(key) {
            Some(Value::Array(names)) if key == "creator" => {
                let joined = names
                    .iter()
                    .filter_map(value_to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    return joined;
                }
            }
            Some(value) => {
                if let Some(name) = value_to_string(value).filter(|s| !s.is_empty()) {
                    return name;
                }
            }
            None => {}
        }
    }
    String::new()
}

/// 作者頁面：依來源 ID 組成
pub fn author_url_of(data: &Value) -> String {
    let member = str_or_default(data, "member_id");
    let has = |key: &str| data.get(key).is_some();

    if has("pixiv_id") {
        format!("https://www.pixiv.net/users/{}", member)
    } else if has("seiga_id") {
        format!("https://seiga.nicovideo.jp/user/illust/{}", member)
    } else if has("nijie_id") {
        format!("https://nijie.info/members.php?id={}", member)
    } else if has("bcy_id") {
        format!("https://bcy.net/u/{}", member)
    } else if has("tweet_id") {
        format!(
            "https://twitter.com/intent/user?user_id={}",
            str_or_default(data, "twitter_user_id")
        )
    } else if has("pawoo_user_acct") {
        format!("https://pawoo.net/@{}", str_or_default(data, "pawoo_user_acct"))
    } else {
        str_or_default(data, "author_url")
    }
}

/// SauceNAO 完整回應
#[derive(Debug, Clone, Default)]
pub struct SauceNaoResponse {
    pub origin: Value,
    pub url: String,
    pub status_code: u16,
    pub raw: Vec<SauceNaoItem>,
    pub short_remaining: Option<i64>,
    pub long_remaining: Option<i64>,
    pub user_id: Option<i64>,
    pub account_type: Option<i64>,
    pub short_limit: Option<String>,
    pub long_limit: Option<String>,
    pub status: Option<i64>,
    pub results_requested: Option<i64>,
    pub search_depth: Option<i64>,
    pub minimum_similarity: Option<f64>,
    pub results_returned: Option<i64>,
    /// API 回傳的錯誤訊息（如 key 無效）
    pub message: Option<String>,
}

impl SauceNaoResponse {
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }
}

impl ResponseParser for SauceNaoResponse {
    type Payload = Value;

    fn parse(payload: &Value, _resp_url: &str) -> Result<Self> {
        let header = payload
            .get("header")
            .filter(|h| h.is_object())
            .ok_or_else(|| EngineError::malformed("saucenao parse", "missing header"))?;

        let int = |key: &str| header.get(key).and_then(as_i64);
        let text = |key: &str| header.get(key).and_then(value_to_string);

        let raw = payload
            .get("results")
            .and_then(|r| r.as_array())
            .map(|results| results.iter().map(SauceNaoItem::from_value).collect())
            .unwrap_or_default();

        Ok(Self {
            origin: payload.clone(),
            url: format!(
                "https://saucenao.com/search.php?url=https://saucenao.com{}",
                text("query_image_display").unwrap_or_default()
            ),
            status_code: 200,
            raw,
            short_remaining: int("short_remaining"),
            long_remaining: int("long_remaining"),
            user_id: int("user_id"),
            account_type: int("account_type"),
            short_limit: text("short_limit"),
            long_limit: text("long_limit"),
            status: int("status"),
            results_requested: int("results_requested"),
            search_depth: int("search_depth"),
            minimum_similarity: deep_get(payload, "header.minimum_similarity").and_then(as_f64),
            results_returned: int("results_returned"),
            message: text("message"),
        })
    }
}

impl EngineResponse for SauceNaoResponse {
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
                similarity: Some(item.similarity),
                extras: vec![
                    ("author".to_string(), item.author.clone()),
                    ("author_url".to_string(), item.author_url.clone()),
                    ("index_name".to_string(), item.index_name.clone()),
                ],
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let Some(first) = self.raw.first() else {
            return match &self.message {
                Some(message) if !message.is_empty() => {
                    format!("未找到匹配結果 ({})", message)
                }
                _ => "未找到匹配結果".to_string(),
            };
        };

        let mut lines = vec![
            format!("相似度: {}%", first.similarity),
            format!("標題: {}", first.title),
            format!("作者: {}", first.author),
            format!("作者連結: {}", first.author_url),
            format!("作者連結（備用）: {}", first.source),
            format!("作品連結: {}", first.url),
        ];
        if first.ext_urls.is_empty() {
            lines.push("更多相關連結: 無".to_string());
        } else {
            lines.push("更多相關連結:".to_string());
            for (i, url) in first.ext_urls.iter().enumerate() {
                lines.push(format!("  #{} {}", i + 1, url));
            }
        }
        lines.join("\n")
    }
}
