// 宣告子模組
pub mod engine;
pub mod parsers;
pub mod services;
pub mod trait_def;
pub mod types;
pub mod utils;

// 重新導出常用項目（讓外部可以用 reverse_search::XXX 直接存取）
pub use engine::{ReverseSearchEngine, format_error};
pub use trait_def::{EngineResponse, ReverseSearchService};
pub use types::{SearchParameters, SearchResponse};

use crate::config::SearchConfig;
use crate::error::Result;
use crate::types::ImageInput;

/// 使用預設設定執行單次搜尋
pub async fn search(
    engine: &str,
    input: ImageInput,
    params: &SearchParameters,
) -> Result<SearchResponse> {
    ReverseSearchEngine::new(SearchConfig::default())
        .search(engine, input, params)
        .await
}
