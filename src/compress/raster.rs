//! Adaptive raster compression
//!
//! Walks JPEG quality down from a high starting point until the encoded size
//! fits the target, optionally shrinking resolution once quality gets low.
//! Stops early (best effort) at the quality floor or when the image would
//! become degenerately small.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::config::defaults::*;
use crate::error::{ConfigError, ToolError};

/// What the caller wants out of the compressor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionTarget {
    pub max_size_kb: u32,
    pub allow_resize: bool,
}

impl CompressionTarget {
    pub fn new(max_size_kb: u32, allow_resize: bool) -> Result<Self, ConfigError> {
        if max_size_kb == 0 {
            return Err(ConfigError::InvalidTargetSize("0".to_string()));
        }
        Ok(Self {
            max_size_kb,
            allow_resize,
        })
    }
}

/// Parse a user-entered target size in KB
pub fn parse_max_kb(value: &str) -> Result<u32, ConfigError> {
    let trimmed = value.trim();
    match trimmed.parse::<u32>() {
        Ok(kb) if kb > 0 => Ok(kb),
        _ => Err(ConfigError::InvalidTargetSize(trimmed.to_string())),
    }
}

/// Tuning knobs for the search loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionParams {
    pub initial_quality: u8,
    pub quality_step: u8,
    pub quality_floor: u8,
    pub resize_threshold: u8,
    pub resize_factor: f32,
    pub min_dimension: u32,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            initial_quality: INITIAL_QUALITY,
            quality_step: QUALITY_STEP,
            quality_floor: QUALITY_FLOOR,
            resize_threshold: RESIZE_THRESHOLD,
            resize_factor: RESIZE_FACTOR,
            min_dimension: MIN_DIMENSION,
        }
    }
}

/// Encodes an RGB bitmap at a given quality
pub trait RasterEncoder {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, ToolError>;
}

/// Baseline JPEG encoder backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegRasterEncoder;

impl RasterEncoder for JpegRasterEncoder {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, ToolError> {
        let mut out = Cursor::new(Vec::new());
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder.encode_image(image)?;
        Ok(out.into_inner())
    }
}

/// One pass of the search loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub size_kb: u64,
}

/// Final result of the search
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub size_kb: u64,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
    pub attempts: Vec<Attempt>,
}

impl CompressedImage {
    pub fn met_target(&self, target: &CompressionTarget) -> bool {
        self.size_kb <= u64::from(target.max_size_kb)
    }
}

/// Re-encode `image` until it fits `target` or a floor is reached.
pub fn compress_to_target<E: RasterEncoder>(
    image: &RgbImage,
    target: &CompressionTarget,
    params: &CompressionParams,
    encoder: &E,
) -> Result<CompressedImage, ToolError> {
    let (original_width, original_height) = image.dimensions();
    let step = params.quality_step.max(1);

    let mut quality = params.initial_quality;
    let (mut width, mut height) = (original_width, original_height);
    let mut attempts = Vec::new();

    loop {
        let bytes = if (width, height) == (original_width, original_height) {
            encoder.encode(image, quality)?
        } else {
            // Resample from the source, never from the previous attempt
            let resized = imageops::resize(image, width, height, FilterType::Lanczos3);
            encoder.encode(&resized, quality)?
        };

        let size_kb = bytes.len() as u64 / 1024;
        attempts.push(Attempt {
            quality,
            width,
            height,
            size_kb,
        });
        log::debug!(
            "attempt {}: q={} {}x{} -> {} KB",
            attempts.len(),
            quality,
            width,
            height,
            size_kb
        );

        let finish = |attempts: Vec<Attempt>| CompressedImage {
            bytes,
            size_kb,
            quality,
            width,
            height,
            attempts,
        };

        if size_kb <= u64::from(target.max_size_kb) || quality <= params.quality_floor {
            return Ok(finish(attempts));
        }

        let next_quality = quality.saturating_sub(step);

        if target.allow_resize && next_quality <= params.resize_threshold {
            let next_width = (width as f32 * params.resize_factor) as u32;
            let next_height = (height as f32 * params.resize_factor) as u32;
            if next_width < params.min_dimension || next_height < params.min_dimension {
                log::debug!(
                    "stopping: {}x{} would fall below {} px",
                    next_width,
                    next_height,
                    params.min_dimension
                );
                return Ok(finish(attempts));
            }
            width = next_width;
            height = next_height;
        }

        quality = next_quality;
    }
}
