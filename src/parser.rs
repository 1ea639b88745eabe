use crate::error::Result;
use serde_json::Value;

/// Parser Trait - 每個引擎實作自己的回應解析
pub trait ResponseParser: Sized {
    /// 原始回應格式（JSON、HTML 等）
    type Payload: ?Sized;

    /// 解析完整回應
    fn parse(payload: &Self::Payload, resp_url: &str) -> Result<Self>;
}

/// 深度取值，支援 `key[0].sub` 與 `a[0][1]` 路徑
///
/// 任何一段不存在都回傳 `None`，不會 panic。
pub fn deep_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;

    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }

        let (key, mut rest) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };

        if !key.is_empty() {
            current = current.get(key)?;
        }

        while !rest.is_empty() {
            let close = rest.find(']')?;
            if !rest.starts_with('[') {
                return None;
            }
            let index: usize = rest[1..close].trim().parse().ok()?;
            current = current.get(index)?;
            rest = &rest[close + 1..];
        }
    }

    Some(current)
}

/// 深度取字串，數字會轉成字串
pub fn deep_str(value: &Value, path: &str) -> Option<String> {
    deep_get(value, path).and_then(value_to_string)
}

/// 依優先順序取第一個存在且非空的欄位
pub fn first_present(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| data.get(*key))
        .filter_map(value_to_string)
        .find(|s| !s.is_empty())
}

/// 取字串欄位，不存在時回傳空字串
pub fn str_or_default(data: &Value, key: &str) -> String {
    data.get(key).and_then(value_to_string).unwrap_or_default()
}

/// 字串陣列欄位
pub fn string_list(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(value_to_string).collect())
        .unwrap_or_default()
}

/// 純量轉字串（null、物件、陣列回傳 None）
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 數字或數字字串轉 f64
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 數字或數字字串轉 u64
pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 數字或數字字串轉 i64
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 從 URL 取出網站名稱（去掉 www.）
pub fn site_name(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// 正規化 URL（處理相對路徑）
pub fn normalize_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with("//") {
        format!("https:{}", url)
    } else if url.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), url)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), url)
    }
}
