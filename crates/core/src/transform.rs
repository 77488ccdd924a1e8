use crate::planner::{ResizeMode, TransformPlan};
use crate::{CoreError, CoreResult};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use imagemill_storage::probe;
use serde_json::{Map, Value};
use std::io::Cursor;

const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Output formats the engine can encode. Informational unless
/// `enforce_supported_formats` is enabled.
pub const SUPPORTED_FORMATS: &[&str] = &["bmp", "gif", "ico", "jpeg", "png", "tiff", "webp"];

pub fn supported_formats() -> &'static [&'static str] {
    SUPPORTED_FORMATS
}

pub fn is_supported_format(format: &str) -> bool {
    let normalized = match format.to_ascii_lowercase().as_str() {
        "jpg" => "jpeg".to_string(),
        other => other.to_string(),
    };
    SUPPORTED_FORMATS.contains(&normalized.as_str())
}

/// The decoded source stream shared read-only across all task pipelines.
pub struct DecodedSource {
    pub pixels: DynamicImage,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

pub fn decode_source(bytes: &[u8]) -> CoreResult<DecodedSource> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::transform(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| CoreError::transform("unrecognized source image format"))?;

    let pixels = reader
        .decode()
        .map_err(|e| CoreError::transform(e.to_string()))?;

    Ok(DecodedSource {
        width: pixels.width(),
        height: pixels.height(),
        format: probe::format_name(format).to_string(),
        pixels,
    })
}

/// The transformed output buffer plus the metadata read back from it.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub buffer: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: String,
}

/// Apply one task's plan to the shared source pixels on an isolated
/// pipeline: resize, then encode into the resolved output format. The
/// result metadata is re-derived from the output buffer because a resize
/// mode may have computed one dimension.
pub fn execute(source: &DynamicImage, plan: &TransformPlan) -> CoreResult<TransformResult> {
    let (target_width, target_height) =
        resolve_dimensions(source.width(), source.height(), &plan.resize);

    let resized = if (target_width, target_height) == (source.width(), source.height()) {
        source.clone()
    } else {
        source.resize_exact(target_width, target_height, FilterType::Lanczos3)
    };

    let buffer = encode(&resized, &plan.format, &plan.encoder_args)?;

    let info = probe::probe(&buffer).map_err(|e| CoreError::transform(e.to_string()))?;

    Ok(TransformResult {
        buffer,
        width: info.width,
        height: info.height,
        format: info.format,
    })
}

/// A fixed width or height derives the free dimension from the source
/// aspect ratio; exact targets pass through untouched.
fn resolve_dimensions(source_width: u32, source_height: u32, mode: &ResizeMode) -> (u32, u32) {
    match *mode {
        ResizeMode::Width(width) => (width, derived_extent(source_height, source_width, width)),
        ResizeMode::Height(height) => (derived_extent(source_width, source_height, height), height),
        ResizeMode::Exact(width, height) => (width, height),
    }
}

fn derived_extent(source_free: u32, source_fixed: u32, fixed: u32) -> u32 {
    let scaled = fixed as f64 * source_free as f64 / source_fixed as f64;
    (scaled.round() as u32).max(1)
}

fn encode(image: &DynamicImage, format: &str, args: &Map<String, Value>) -> CoreResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());

    match format.to_ascii_lowercase().as_str() {
        "jpeg" | "jpg" => {
            let quality = quality_arg(args).unwrap_or(DEFAULT_JPEG_QUALITY);
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            image
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| CoreError::transform(format!("JPEG encode failed: {}", e)))?;
        }
        "png" => {
            image
                .write_to(&mut buf, ImageFormat::Png)
                .map_err(|e| CoreError::transform(format!("PNG encode failed: {}", e)))?;
        }
        "webp" => {
            // The webp encoder is lossless only; a quality arg is ignored.
            let encoder = WebPEncoder::new_lossless(&mut buf);
            image
                .write_with_encoder(encoder)
                .map_err(|e| CoreError::transform(format!("WebP encode failed: {}", e)))?;
        }
        other => {
            let target = ImageFormat::from_extension(other).ok_or_else(|| {
                CoreError::transform(format!("unsupported output format: {}", other))
            })?;
            image
                .write_to(&mut buf, target)
                .map_err(|e| CoreError::transform(format!("{} encode failed: {}", other, e)))?;
        }
    }

    Ok(buf.into_inner())
}

/// Recognized passthrough encoder argument. Unknown args are left for the
/// engine, which ignores them.
fn quality_arg(args: &Map<String, Value>) -> Option<u8> {
    args.get("quality")
        .and_then(Value::as_u64)
        .map(|quality| quality.clamp(1, 100) as u8)
}
