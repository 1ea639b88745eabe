use scraper::{ElementRef, Html, Selector};

/// 結果之間的分隔線
pub fn separator() -> String {
    "-".repeat(50)
}

/// 在範圍內選取所有符合的元素
pub fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(e) => {
            tracing::warn!(selector = css, error = ?e, "invalid selector");
            Vec::new()
        }
    }
}

/// 選取第一個符合的元素
pub fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

/// 依序嘗試多個選擇器，回傳第一個找到的元素
pub fn select_first_of<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|css| select_first(scope, css))
}

/// 元素文字（合併空白）
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// 第一個符合選擇器的元素文字
pub fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    select_first(scope, css)
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// 依序取第一個存在且非空的屬性
pub fn attr_of(element: ElementRef<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| element.value().attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// 所有符合選擇器的 script 內容
pub fn script_texts(document: &Html, css: &str) -> Vec<String> {
    select_all(document.root_element(), css)
        .into_iter()
        .map(|script| script.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect()
}
