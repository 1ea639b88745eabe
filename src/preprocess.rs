use crate::error::{EngineError, Result};
use crate::types::ImageFile;
use image::codecs::jpeg::JpegEncoder;

const JPEG_QUALITY: u8 = 85;

/// 是否為 GIF（路徑看副檔名，位元組看檔頭）
pub fn is_gif(file: &ImageFile) -> bool {
    match file {
        ImageFile::Path(path) => path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gif"))
            .unwrap_or(false),
        ImageFile::Bytes(bytes) => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
    }
}

/// 取 GIF 第一幀轉成 JPEG
pub fn gif_to_jpeg(data: &[u8]) -> Result<Vec<u8>> {
    let frame = image::load_from_memory(data)
        .map_err(|e| EngineError::invalid_input(format!("無法解碼 GIF: {}", e)))?
        .to_rgb8();

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, JPEG_QUALITY)
        .encode_image(&frame)
        .map_err(|e| EngineError::invalid_input(format!("無法轉換為 JPEG: {}", e)))?;
    Ok(output)
}

/// GIF 轉成靜態 JPEG，其他格式原樣回傳
pub async fn normalize_image(file: ImageFile) -> Result<ImageFile> {
    if !is_gif(&file) {
        return Ok(file);
    }
    let data = file.read().await?;
    let jpeg = gif_to_jpeg(&data)?;
    tracing::debug!(before = data.len(), after = jpeg.len(), "converted GIF to JPEG");
    Ok(ImageFile::Bytes(jpeg))
}
