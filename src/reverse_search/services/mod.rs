pub mod animetrace;
pub mod baidu;
pub mod bing;
pub mod copyseeker;
pub mod ehentai;
pub mod google;
pub mod saucenao;
pub mod tineye;

pub use animetrace::AnimeTraceService;
pub use baidu::BaiDuService;
pub use bing::BingService;
pub use copyseeker::CopyseekerService;
pub use ehentai::EHentaiService;
pub use google::GoogleLensService;
pub use saucenao::SauceNaoService;
pub use tineye::TinEyeService;

use crate::error::Result;
use crate::fetcher::{FilePart, HttpFetcher};
use crate::types::ImageSource;

/// 取得圖片位元組（網址會先下載）
pub(crate) async fn image_bytes(
    fetcher: &HttpFetcher,
    source: ImageSource<'_>,
    phase: &'static str,
) -> Result<(Vec<u8>, String)> {
    match source {
        ImageSource::Url(url) => {
            let bytes = fetcher.download(phase, url).await?;
            Ok((bytes, "image.jpg".to_string()))
        }
        ImageSource::File(file) => Ok((file.read().await?.into_owned(), file.file_name())),
    }
}

/// 本地圖片的 multipart 欄位
pub(crate) async fn file_part(
    name: &str,
    file: &crate::types::ImageFile,
) -> Result<FilePart> {
    let bytes = file.read().await?.into_owned();
    Ok(FilePart::new(name, bytes).file_name(file.file_name()))
}

/// 去掉結尾的 `/`
pub(crate) fn trim_base(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}
