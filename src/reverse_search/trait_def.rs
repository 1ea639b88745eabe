use super::types::SearchResponse;
use crate::error::Result;
use crate::types::{EngineKind, ImageInput, ResultItem};

/// 反向搜尋服務 Trait（每個引擎一個實作）
#[async_trait::async_trait]
pub trait ReverseSearchService: Send + Sync {
    /// 引擎種類
    fn kind(&self) -> EngineKind;

    /// 服務名稱
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    /// 搜尋單張圖片
    async fn search(&self, input: &ImageInput) -> Result<SearchResponse>;
}

/// 解析後的回應共同介面
pub trait EngineResponse {
    /// 解析後的最終 URL
    fn url(&self) -> &str;

    /// 正規化的結果列表
    fn items(&self) -> Vec<ResultItem>;

    /// 純文字結果
    fn show_result(&self) -> String;

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}
