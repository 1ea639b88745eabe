use crate::error::Result;
use crate::parser::{ResponseParser, site_name};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::{
    attr_of, element_text, first_text, script_texts, select_all, select_first, separator,
};
use crate::types::{ResultItem, SearchType};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use std::sync::LazyLock;

const GOOGLE_SEARCH: &str = "https://www.google.com";

static LDI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"google\.ldi\s*=\s*(\{[^}]+\})").unwrap_or_else(|_| unreachable!("static regex"))
});
static LDI_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'](dimg_[^"']+)["']\s*:\s*["']([^"']*)["']"#)
        .unwrap_or_else(|_| unreachable!("static regex"))
});
static IMAGE_IDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var ii=\[([^\]]*)\];").unwrap_or_else(|_| unreachable!("static regex"))
});
static BASE64_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var s='(data:image/[^;]+;base64,[^']+)';")
        .unwrap_or_else(|_| unreachable!("static regex"))
});

/// 頁面內嵌的圖片對照表（延遲載入 URL 與 base64）
#[derive(Debug, Clone, Default)]
pub struct ImageMaps {
    pub urls: HashMap<String, String>,
    pub base64: HashMap<String, String>,
}

impl ImageMaps {
    /// 從 `<script nonce>` 區塊收集圖片對照表
    pub fn extract(document: &Html) -> Self {
        let mut maps = Self::default();
        for script in script_texts(document, "script[nonce]") {
            maps.collect_ldi(&script);
            maps.collect_base64(&script);
        }
        maps
    }

    fn collect_ldi(&mut self, script: &str) {
        let Some(object) = LDI_RE.captures(script).and_then(|caps| caps.get(1)) else {
            return;
        };
        for pair in LDI_PAIR_RE.captures_iter(object.as_str()) {
            let url = pair[2].replace("\\u003d", "=").replace("\\u0026", "&");
            self.urls.insert(pair[1].to_string(), url);
        }
    }

    fn collect_base64(&mut self, script: &str) {
        if !script.contains("_setImagesSrc") {
            return;
        }
        let (Some(ids), Some(data)) =
            (IMAGE_IDS_RE.captures(script), BASE64_RE.captures(script))
        else {
            return;
        };
        for id in ids[1].split(',') {
            let id = id.trim().trim_matches('\'');
            if !id.is_empty() {
                self.base64.insert(id.to_string(), data[1].to_string());
            }
        }
    }

    /// 圖片元素的實際來源
    pub fn resolve(&self, img: Option<ElementRef<'_>>) -> String {
        let Some(img) = img else {
            return String::new();
        };
        match attr_of(img, &["data-iid", "id"]) {
            Some(id) => self
                .urls
                .get(&id)
                .or_else(|| self.base64.get(&id))
                .cloned()
                .unwrap_or_default(),
            None => attr_of(img, &["data-src", "src"]).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoogleLensItem {
    pub title: String,
    pub url: String,
    pub site_name: String,
    pub thumbnail: String,
    /// 圖片尺寸 `WxH`（僅完全相符結果）
    pub size: Option<String>,
}

impl GoogleLensItem {
    fn regular(el: ElementRef<'_>, maps: &ImageMaps) -> Self {
        let url = select_first(el, "a.LBcIee")
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();
        Self {
            title: first_text(el, "a.LBcIee .Yt787").unwrap_or_default(),
            site_name: first_text(el, "a.LBcIee .R8BTeb.q8U8x.LJEGod.du278d.i0Rdmd")
                .unwrap_or_else(|| site_name(&url)),
            thumbnail: maps.resolve(select_first(el, ".gdOPf.q07dbf.uhHOwf.ez24Df img")),
            size: None,
            url,
        }
    }

    fn exact(el: ElementRef<'_>, maps: &ImageMaps) -> Self {
        let url = select_first(el, "a.ngTNl")
            .and_then(|a| a.value().attr("href"))
            .unwrap_or_default()
            .to_string();
        let size = select_all(el, ".oYQBg.Zn52Me > span")
            .into_iter()
            .map(element_text)
            .find(|text| text.contains('x'));
        Self {
            title: first_text(el, ".ZhosBf").unwrap_or_default(),
            site_name: first_text(el, ".XC18Gb .LbKnXb .xuPcX").unwrap_or_else(|| site_name(&url)),
            thumbnail: maps.resolve(select_first(el, ".GmoL0c .zVq10e img")),
            size,
            url,
        }
    }
}

/// 相關搜尋
#[derive(Debug, Clone, Default)]
pub struct RelatedSearch {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
}

/// 待解析的結果頁
#[derive(Debug, Clone)]
pub struct LensPage {
    pub html: String,
    pub search_type: SearchType,
    /// 0 表示不限制
    pub max_results: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GoogleLensResponse {
    pub origin: String,
    pub url: String,
    pub search_type: SearchType,
    pub raw: Vec<GoogleLensItem>,
    pub related_searches: Vec<RelatedSearch>,
}

impl ResponseParser for GoogleLensResponse {
    type Payload = LensPage;

    fn parse(page: &LensPage, resp_url: &str) -> Result<Self> {
        let document = Html::parse_document(&page.html);
        let root = document.root_element();
        let maps = ImageMaps::extract(&document);
        let limit = if page.max_results == 0 { usize::MAX } else { page.max_results };

        let (raw, related_searches) = if page.search_type == SearchType::ExactMatches {
            let raw = select_all(root, ".YxbOwd")
                .into_iter()
                .take(limit)
                .map(|el| GoogleLensItem::exact(el, &maps))
                .collect();
            (raw, Vec::new())
        } else {
            let raw = select_all(root, ".vEWxFf.RCxtQc.my5z3d")
                .into_iter()
                .take(limit)
                .map(|el| GoogleLensItem::regular(el, &maps))
                .collect();
            let related = select_all(root, ".Kg0xqe")
                .into_iter()
                .map(|el| RelatedSearch {
                    title: first_text(el, ".I9S4yc").unwrap_or_default(),
                    url: el
                        .value()
                        .attr("href")
                        .map(|href| format!("{}{}", GOOGLE_SEARCH, href))
                        .unwrap_or_default(),
                    thumbnail: maps.resolve(select_first(el, "img")),
                })
                .collect();
            (raw, related)
        };

        Ok(Self {
            origin: page.html.clone(),
            url: resp_url.to_string(),
            search_type: page.search_type,
            raw,
            related_searches,
        })
    }
}

impl EngineResponse for GoogleLensResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        self.raw
            .iter()
            .map(|item| {
                let mut extras = vec![("site_name".to_string(), item.site_name.clone())];
                if let Some(size) = &item.size {
                    extras.push(("size".to_string(), size.clone()));
                }
                ResultItem {
                    title: item.title.clone(),
                    url: item.url.clone(),
                    thumbnail: item.thumbnail.clone(),
                    similarity: None,
                    extras,
                }
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let exact = self.search_type == SearchType::ExactMatches;
        if self.raw.is_empty() {
            let message = if exact { "未找到完全相符結果" } else { "未找到匹配結果" };
            return message.to_string();
        }

        let header = if exact { "完全相符的結果:" } else { "搜尋結果:" };
        let mut lines = vec![header.to_string(), separator()];
        for (i, item) in self.raw.iter().enumerate() {
            lines.push(format!("結果 #{}", i + 1));
            lines.push(format!("標題: {}", item.title));
            lines.push(format!("連結: {}", item.url));
            lines.push(separator());
        }
        lines.join("\n")
    }
}
