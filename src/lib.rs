//! 以圖搜圖：八個搜尋引擎的協定實作與結果正規化

pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod parser;
pub mod preprocess;
pub mod reverse_search;
pub mod types;

pub use config::SearchConfig;
pub use error::{EngineError, ErrorKind, Result};
pub use reverse_search::{
    EngineResponse, ReverseSearchEngine, ReverseSearchService, SearchParameters, SearchResponse,
    search,
};
pub use types::{EngineKind, ImageFile, ImageInput, ResultItem};
