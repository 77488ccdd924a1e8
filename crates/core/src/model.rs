use serde::{Deserialize, Serialize};

/// Request-scoped descriptor of the uploaded source image. `name` is the
/// content-derived identifier used as the base filename for all derivatives.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub name: String,
}

/// The externally visible record for one produced variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: f64,
}

/// width/height rounded to two decimal places, or 0 for a zero height.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    if height > 0 {
        (width as f64 / height as f64 * 100.0).round() / 100.0
    } else {
        0.0
    }
}
