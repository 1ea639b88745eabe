use crate::error::Result;
use crate::parser::ResponseParser;
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::{attr_of, element_text, first_text, select_all, select_first_of};
use crate::types::ResultItem;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

const NO_RESULTS_MARKER: &str = "No unfiltered results";

static PAGES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+pages?$").unwrap_or_else(|_| unreachable!("static regex"))
});

/// 單一畫廊
#[derive(Debug, Clone, Default)]
pub struct EHentaiItem {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    /// 分類（Doujinshi、Manga…）
    pub kind: String,
    pub date: String,
    pub pages: Option<u32>,
    /// `category:tag` 格式
    pub tags: Vec<String>,
}

impl EHentaiItem {
    fn from_element(row: ElementRef<'_>) -> Self {
        let glink = select_first_of(row, &[".glink"]);

        // 標題連結外層的 <a>
        let url = glink
            .and_then(|link| {
                link.ancestors()
                    .filter_map(ElementRef::wrap)
                    .find(|el| el.value().name() == "a")
            })
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();

        let thumbnail = select_first_of(row, &[".glthumb img", ".gl1e img", ".gl3t img"])
            .and_then(|img| attr_of(img, &["data-src", "src"]))
            .unwrap_or_default();

        let pages = select_all(row, "div").into_iter().find_map(|div| {
            let text = element_text(div);
            PAGES_RE
                .captures(&text)
                .and_then(|caps| caps.get(1))
                .and_then(|count| count.as_str().parse().ok())
        });

        let tags = select_all(row, r#"div[class="gt"], div[class="gtl"]"#)
            .into_iter()
            .filter_map(|tag| tag.value().attr("title"))
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            title: glink.map(element_text).unwrap_or_default(),
            url,
            thumbnail,
            kind: select_first_of(row, &[".cs", ".cn"]).map(element_text).unwrap_or_default(),
            date: first_text(row, "[id^='posted']").unwrap_or_default(),
            pages,
            tags,
        }
    }

    /// 依分類整理標籤，保持出現順序
    pub fn grouped_tags(&self) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for tag in &self.tags {
            let Some((category, name)) = tag.split_once(':') else {
                continue;
            };
            match groups.iter_mut().find(|(c, _)| c == category) {
                Some((_, names)) => names.push(name.to_string()),
                None => groups.push((category.to_string(), vec![name.to_string()])),
            }
        }
        groups
    }
}

#[derive(Debug, Clone, Default)]
pub struct EHentaiResponse {
    pub origin: String,
    pub url: String,
    pub raw: Vec<EHentaiItem>,
}

impl ResponseParser for EHentaiResponse {
    type Payload = str;

    fn parse(payload: &str, resp_url: &str) -> Result<Self> {
        let raw = if payload.contains(NO_RESULTS_MARKER) {
            Vec::new()
        } else {
            let document = Html::parse_document(payload);
            let root = document.root_element();
            // 列表模式（表格）或縮圖模式
            let rows: Vec<_> = select_all(root, ".itg > tbody > tr, .itg > tr")
                .into_iter()
                .filter(|row| !select_all(*row, "td").is_empty())
                .collect();
            let rows = if rows.is_empty() {
                select_all(root, ".itg > .gl1t")
            } else {
                rows
            };
            rows.into_iter().map(EHentaiItem::from_element).collect()
        };

        Ok(Self {
            origin: payload.to_string(),
            url: resp_url.to_string(),
            raw,
        })
    }
}

impl EngineResponse for EHentaiResponse {
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
                extras: vec![
                    ("type".to_string(), item.kind.clone()),
                    ("date".to_string(), item.date.clone()),
                    ("tags".to_string(), item.tags.join(", ")),
                ],
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let Some(first) = self.raw.first() else {
            return "未找到匹配結果".to_string();
        };

        let mut lines = vec![
            "結果 #1".to_string(),
            format!("連結: {}", first.url),
            format!("上傳時間: {}", first.date),
            format!("標題: {}", first.title),
            format!("類型: {}", first.kind),
            format!(
                "頁數: {}",
                first.pages.map(|p| p.to_string()).unwrap_or_else(|| "解析失敗".to_string())
            ),
            "標籤:".to_string(),
        ];
        for (category, names) in first.grouped_tags() {
            lines.push(format!("  {}: {}", category, names.join("; ")));
        }
        lines.join("\n")
    }
}
