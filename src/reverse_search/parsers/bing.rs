use crate::error::{EngineError, Result};
use crate::parser::{ResponseParser, deep_str, str_or_default, string_list};
use crate::reverse_search::trait_def::EngineResponse;
use crate::reverse_search::utils::separator;
use crate::types::ResultItem;
use serde_json::Value;

/// 包含此圖片的頁面 / 視覺相似圖片
#[derive(Debug, Clone, Default)]
pub struct BingImageItem {
    pub name: String,
    pub url: String,
    pub thumbnail: String,
    pub image_url: String,
}

impl BingImageItem {
    fn from_value(raw: &Value) -> Self {
        Self {
            name: str_or_default(raw, "name"),
            url: str_or_default(raw, "hostPageUrl"),
            thumbnail: str_or_default(raw, "thumbnailUrl"),
            image_url: str_or_default(raw, "contentUrl"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelatedSearch {
    pub text: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Default)]
pub struct Attraction {
    pub url: String,
    pub title: String,
    pub search_url: String,
    pub interest_types: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TravelCard {
    pub card_type: String,
    pub title: String,
    pub url: String,
    pub image_url: String,
    pub image_source_url: String,
}

/// 旅遊資訊（地標類圖片）
#[derive(Debug, Clone, Default)]
pub struct TravelInfo {
    pub destination_name: String,
    pub travel_guide_url: String,
    pub attractions: Vec<Attraction>,
    pub travel_cards: Vec<TravelCard>,
}

impl TravelInfo {
    fn from_value(data: &Value) -> Self {
        let list = |key: &str| {
            data.get(key)
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default()
        };

        Self {
            destination_name: str_or_default(data, "destinationName"),
            travel_guide_url: str_or_default(data, "travelGuideUrl"),
            attractions: list("attractions")
                .iter()
                .map(|a| Attraction {
                    url: str_or_default(a, "attractionUrl"),
                    title: str_or_default(a, "title"),
                    search_url: str_or_default(a, "requeryUrl"),
                    interest_types: string_list(a, "interestTypes"),
                })
                .collect(),
            travel_cards: list("travelCards")
                .iter()
                .map(|c| TravelCard {
                    card_type: str_or_default(c, "cardType"),
                    title: str_or_default(c, "title"),
                    url: str_or_default(c, "clickUrl"),
                    image_url: str_or_default(c, "image"),
                    image_source_url: str_or_default(c, "imageSourceUrl"),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SocialProfile {
    pub url: String,
    pub social_network: String,
}

/// 辨識出的實體（人物、地點等）
#[derive(Debug, Clone, Default)]
pub struct EntityItem {
    pub name: String,
    pub thumbnail: String,
    pub description: String,
    pub profiles: Vec<SocialProfile>,
    pub short_description: String,
}

impl EntityItem {
    fn from_value(data: &Value) -> Self {
        let profiles = data
            .get("socialMediaInfo")
            .and_then(|s| s.get("profiles"))
            .and_then(|p| p.as_array())
            .map(|profiles| {
                profiles
                    .iter()
                    .map(|p| SocialProfile {
                        url: str_or_default(p, "profileUrl"),
                        social_network: str_or_default(p, "socialNetwork"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: str_or_default(data, "name"),
            thumbnail: deep_str(data, "image.thumbnailUrl").unwrap_or_default(),
            description: str_or_default(data, "description"),
            profiles,
            short_description: deep_str(data, "entityPresentationInfo.entityTypeDisplayHint")
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BingResponse {
    pub origin: Value,
    pub url: String,
    pub pages_including: Vec<BingImageItem>,
    pub visual_search: Vec<BingImageItem>,
    pub related_searches: Vec<RelatedSearch>,
    pub best_guess: Option<String>,
    pub travel: Option<TravelInfo>,
    pub entities: Vec<EntityItem>,
}

impl BingResponse {
    fn apply_action(&mut self, action: &Value) {
        let values = || {
            action
                .get("data")
                .and_then(|d| d.get("value"))
                .and_then(|v| v.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default()
        };

        match action.get("actionType").and_then(|t| t.as_str()).unwrap_or_default() {
            "PagesIncluding" => self
                .pages_including
                .extend(values().iter().map(BingImageItem::from_value)),
            "VisualSearch" => self
                .visual_search
                .extend(values().iter().map(BingImageItem::from_value)),
            "RelatedSearches" => {
                self.related_searches
                    .extend(values().iter().map(|v| RelatedSearch {
                        text: str_or_default(v, "text"),
                        thumbnail: deep_str(v, "thumbnail.url").unwrap_or_default(),
                    }))
            }
            "BestRepresentativeQuery" => {
                self.best_guess = action
                    .get("displayName")
                    .and_then(|n| n.as_str())
                    .map(str::to_string);
            }
            "Travel" => {
                let data = action.get("data").unwrap_or(&Value::Null);
                self.travel = Some(TravelInfo::from_value(data));
            }
            "Entity" => {
                if let Some(data) = action.get("data").filter(|d| !d.is_null()) {
                    self.entities.push(EntityItem::from_value(data));
                }
            }
            _ => {}
        }
    }
}

impl ResponseParser for BingResponse {
    type Payload = Value;

    fn parse(payload: &Value, resp_url: &str) -> Result<Self> {
        if !payload.is_object() {
            return Err(EngineError::malformed("bing parse", "knowledge response is not an object"));
        }

        let mut response = Self {
            origin: payload.clone(),
            url: resp_url.to_string(),
            ..Self::default()
        };

        let tags = payload.get("tags").and_then(|t| t.as_array());
        for tag in tags.into_iter().flatten() {
            let actions = tag.get("actions").and_then(|a| a.as_array());
            for action in actions.into_iter().flatten() {
                response.apply_action(action);
            }
        }
        Ok(response)
    }
}

impl EngineResponse for BingResponse {
    fn url(&self) -> &str {
        &self.url
    }

    fn items(&self) -> Vec<ResultItem> {
        self.pages_including
            .iter()
            .chain(&self.visual_search)
            .map(|item| ResultItem {
                title: item.name.clone(),
                url: item.url.clone(),
                thumbnail: item.thumbnail.clone(),
                similarity: None,
                extras: vec![("image_url".to_string(), item.image_url.clone())],
            })
            .collect()
    }

    fn show_result(&self) -> String {
        let mut lines = vec![separator()];
        for (i, item) in self.pages_including.iter().chain(&self.visual_search).enumerate() {
            lines.push(format!("結果 #{}", i + 1));
            lines.push(format!("標題：{}", item.name));
            lines.push(format!("頁面連結：{}", item.url));
            lines.push(format!("圖片連結：{}", item.image_url));
            lines.push(separator());
        }
        if let Some(best_guess) = self.best_guess.as_deref().filter(|g| !g.is_empty()) {
            lines.push(format!("最佳結果：{}", best_guess));
            lines.push(separator());
        }
        lines.join("\n")
    }
}
