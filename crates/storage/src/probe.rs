use crate::{StorageError, StorageResult};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// Metadata read back from an encoded image buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Derive width/height/format by inspecting encoded image bytes.
///
/// Sinks call this on what was actually written rather than trusting the
/// caller-supplied dimensions.
pub fn probe(bytes: &[u8]) -> StorageResult<ImageInfo> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(StorageError::Io)?;

    let format = reader
        .format()
        .ok_or_else(|| StorageError::Metadata("unrecognized image format".to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| StorageError::Metadata(e.to_string()))?;

    Ok(ImageInfo {
        width,
        height,
        format: format_name(format).to_string(),
    })
}

/// Canonical lowercase name for an image format ("jpeg", not "jpg").
pub fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Ico => "ico",
        ImageFormat::Avif => "avif",
        other => other.extensions_str().first().copied().unwrap_or("unknown"),
    }
}
