//! 送信前の画像縮小

use crate::error::{RecognizerError, Result};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// 長辺が max_size を超える画像をJPEGに縮小する
///
/// 収まっている画像は元のバイト列をそのまま返す。
/// デコードできないデータは ImageLoad エラー。
pub fn prepare_image(bytes: &[u8], max_size: u32) -> Result<Vec<u8>> {
    if bytes.is_empty() {
        return Err(RecognizerError::ImageLoad("空の画像データ".into()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| RecognizerError::ImageLoad(e.to_string()))?;

    if max_size == 0 || img.width().max(img.height()) <= max_size {
        return Ok(bytes.to_vec());
    }

    let resized = img.resize(max_size, max_size, FilterType::Triangle);
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
        .map_err(|e| RecognizerError::ImageLoad(format!("JPEG変換エラー: {}", e)))?;

    Ok(jpeg)
}
