pub mod animetrace;
pub mod baidu;
pub mod bing;
pub mod copyseeker;
pub mod ehentai;
pub mod google;
pub mod saucenao;
pub mod tineye;

pub use animetrace::AnimeTraceResponse;
pub use baidu::BaiDuResponse;
pub use bing::BingResponse;
pub use copyseeker::CopyseekerResponse;
pub use ehentai::EHentaiResponse;
pub use google::GoogleLensResponse;
pub use saucenao::SauceNaoResponse;
pub use tineye::TinEyeResponse;
