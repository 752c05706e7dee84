//! PDF compression helper
//!
//! The default mode re-encodes embedded JPEG images at a quality derived
//! from the requested level, then Flate-compresses every remaining stream
//! with lopdf. The rasterizing mode renders each page to a bitmap and
//! rebuilds the document from JPEG pages, which also shrinks vector-heavy
//! files at the cost of selectable text.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use lopdf::{Object, Stream};

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport};
use crate::config::defaults::RASTER_COMPRESS_DPI;
use crate::config::{Feature, Settings};
use crate::convert::images_to_pdf::add_image_page;
use crate::error::{ConfigError, ToolError};
use crate::pdf::builder::DocumentBuilder;
use crate::pdf::render::{page_size_pt, render_pages};

/// Compression level: 1 keeps quality high, 9 squeezes hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if (1..=9).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ConfigError::InvalidCompressionLevel(level.to_string()))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// JPEG quality for this level, never below 10
    pub fn jpeg_quality(&self) -> u8 {
        100u8.saturating_sub(self.0 * 10).max(10)
    }
}

impl FromStr for CompressionLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let level = trimmed
            .parse::<u8>()
            .map_err(|_| ConfigError::InvalidCompressionLevel(trimmed.to_string()))?;
        Self::new(level)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary of one PDF compression
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PdfCompressionStats {
    pub images_seen: usize,
    pub images_recompressed: usize,
}

fn is_name(obj: Option<&Object>, name: &[u8]) -> bool {
    match obj {
        Some(Object::Name(n)) => n.as_slice() == name,
        Some(Object::Array(items)) if items.len() == 1 => {
            matches!(&items[0], Object::Name(n) if n.as_slice() == name)
        }
        _ => false,
    }
}

/// Re-encode one DCT image stream if that makes it smaller.
///
/// Only DeviceRGB and DeviceGray images are touched; anything else keeps its
/// original bytes.
fn recompress_jpeg_stream(stream: &mut Stream, quality: u8) -> Result<bool, ToolError> {
    let color_space = stream.dict.get(b"ColorSpace").ok();
    let gray = is_name(color_space, b"DeviceGray");
    if !gray && !is_name(color_space, b"DeviceRGB") {
        return Ok(false);
    }

    let decoded = image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)?;

    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    if gray {
        encoder.encode_image(&decoded.to_luma8())?;
    } else {
        encoder.encode_image(&decoded.to_rgb8())?;
    }
    let encoded = out.into_inner();

    if encoded.len() >= stream.content.len() {
        return Ok(false);
    }

    stream.set_content(encoded);
    Ok(true)
}

/// Compress a parsed document in place
pub fn compress_document(
    doc: &mut lopdf::Document,
    level: CompressionLevel,
) -> PdfCompressionStats {
    let quality = level.jpeg_quality();
    let mut stats = PdfCompressionStats::default();

    for (id, object) in doc.objects.iter_mut() {
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_name(stream.dict.get(b"Subtype").ok(), b"Image")
            || !is_name(stream.dict.get(b"Filter").ok(), b"DCTDecode")
        {
            continue;
        }

        stats.images_seen += 1;
        match recompress_jpeg_stream(stream, quality) {
            Ok(true) => stats.images_recompressed += 1,
            Ok(false) => {}
            Err(e) => log::debug!("keeping image {:?} as is: {}", id, e),
        }
    }

    doc.compress();
    stats
}

/// Compress PDF bytes, returning the re-serialized document
pub fn compress_pdf(input: &[u8], level: CompressionLevel) -> Result<Vec<u8>, ToolError> {
    let mut doc = lopdf::Document::load_mem(input)?;
    let stats = compress_document(&mut doc, level);
    log::debug!(
        "recompressed {}/{} images",
        stats.images_recompressed,
        stats.images_seen
    );

    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output)?;
    Ok(output.into_inner())
}

/// Render every page of the PDF at `path` and rebuild it from JPEG pages.
///
/// Pages keep their size in points; the bitmaps are taken at 150 dpi and
/// encoded at the level's JPEG quality.
pub fn rasterize_pdf(path: &Path, level: CompressionLevel) -> Result<Vec<u8>, ToolError> {
    let quality = level.jpeg_quality();
    let mut builder = DocumentBuilder::new();
    render_pages(path, RASTER_COMPRESS_DPI, |_, img| {
        let size = page_size_pt(&img, RASTER_COMPRESS_DPI);
        add_image_page(&mut builder, &img, quality, size).map(|_| ())
    })?;

    let mut doc = builder
        .finish()
        .ok_or_else(|| ToolError::Structure("document has no pages".to_string()))?;
    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output)?;
    Ok(output.into_inner())
}

/// Compress every PDF in the compress workspace
pub fn run_pdf_compression(
    settings: &Settings,
    level: CompressionLevel,
    rasterize: bool,
) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Compress)?;
    let output_dir = settings.output_dir(Feature::Compress);
    let inputs = list_inputs(&settings.input_dir(Feature::Compress), PDF_EXTENSIONS)?;

    Ok(run_batch("Compress PDF", &inputs, |input| {
        let original = fs::read(&input.path)?;
        let compressed = if rasterize {
            rasterize_pdf(&input.path, level)?
        } else {
            compress_pdf(&original, level)?
        };
        fs::write(output_dir.join(&input.name), &compressed)?;
        Ok(format!(
            "{} -> {} KB (was {} KB, level {}{})",
            input.name,
            compressed.len() / 1024,
            original.len() / 1024,
            level,
            if rasterize { ", rasterized" } else { "" }
        ))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_quality_mapping() {
        assert_eq!(CompressionLevel::new(1).unwrap().jpeg_quality(), 90);
        assert_eq!(CompressionLevel::new(5).unwrap().jpeg_quality(), 50);
        assert_eq!(CompressionLevel::new(9).unwrap().jpeg_quality(), 10);
    }

    #[test]
    fn test_level_validation() {
        assert!(CompressionLevel::new(0).is_err());
        assert!(CompressionLevel::new(10).is_err());
        assert_eq!("3".parse::<CompressionLevel>().unwrap().value(), 3);
        assert_eq!(
            "x".parse::<CompressionLevel>(),
            Err(ConfigError::InvalidCompressionLevel("x".to_string()))
        );
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(compress_pdf(&[], CompressionLevel::new(5).unwrap()).is_err());
    }

    #[cfg(not(feature = "render"))]
    #[test]
    fn test_rasterize_needs_render_feature() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        let input = settings.input_dir(Feature::Compress);
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("doc.pdf"), b"%PDF-1.5").unwrap();

        let level = CompressionLevel::new(5).unwrap();
        let report = run_pdf_compression(&settings, level, true).unwrap();
        assert_eq!(report.failed(), 1);
        assert!(!settings.output_dir(Feature::Compress).join("doc.pdf").exists());
    }

    #[cfg(feature = "render")]
    #[test]
    fn test_rasterize_keeps_page_sizes() {
        use crate::pdf::document::test_support::{sample_document, to_bytes};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, to_bytes(&mut sample_document(&[(300, 600), (600, 300)]))).unwrap();

        let bytes = rasterize_pdf(&path, CompressionLevel::new(5).unwrap()).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        let second = crate::pdf::document::media_box(&doc, pages[&2], 2).unwrap();
        assert!((second.width() - 600.0).abs() < 0.5);
        assert!((second.height() - 300.0).abs() < 0.5);
    }
}
