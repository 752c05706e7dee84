//! Page-format classification
//!
//! Paper sizes drift a little between scanners and printers, so formats are
//! matched on aspect ratio within a tolerance band rather than exactly.
//! Orientation is decided separately by comparing height to width.

use crate::model::{FormatBucket, FormatLabel, PageGeometry};

/// A4 long side over short side (297mm / 210mm)
pub const A4_RATIO: f64 = 297.0 / 210.0;

/// F4 long side over short side (330mm / 210mm)
pub const F4_RATIO: f64 = 330.0 / 210.0;

/// Maximum absolute ratio difference still counted as a match
pub const RATIO_TOLERANCE: f64 = 0.04;

/// Slack for rounding in the ratio division, so the band edges are inclusive
const RATIO_EPSILON: f64 = 1e-9;

fn within_tolerance(ratio: f64, target: f64) -> bool {
    (ratio - target).abs() <= RATIO_TOLERANCE + RATIO_EPSILON
}

/// Long side over short side; a zero short side counts as 1
pub fn aspect_ratio(geometry: &PageGeometry) -> f64 {
    let (w, h) = (geometry.width(), geometry.height());
    let short = w.min(h);
    let short = if short == 0.0 { 1.0 } else { short };
    w.max(h) / short
}

/// Match the page against the known formats, ignoring orientation
pub fn detect_bucket(geometry: &PageGeometry) -> Option<FormatBucket> {
    let ratio = aspect_ratio(geometry);
    if within_tolerance(ratio, A4_RATIO) {
        Some(FormatBucket::A4)
    } else if within_tolerance(ratio, F4_RATIO) {
        Some(FormatBucket::F4)
    } else {
        None
    }
}

/// Format and orientation, or `None` when the page matches no known format
pub fn detect(geometry: &PageGeometry) -> Option<FormatLabel> {
    detect_bucket(geometry).map(|bucket| FormatLabel::new(bucket, geometry.is_portrait()))
}

/// Format and orientation, falling back to A4 portrait for unknown sizes
pub fn classify(geometry: &PageGeometry) -> FormatLabel {
    detect(geometry).unwrap_or_default()
}
