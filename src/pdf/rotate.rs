//! Rotate every page of a PDF

use std::fmt;
use std::str::FromStr;

use lopdf::{Document, Object, ObjectId};

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport};
use crate::config::{Feature, Settings};
use crate::error::{ConfigError, ToolError};

use super::document::{self, page_rotation};

/// Clockwise rotation applied on top of the page's current rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAngle {
    Quarter,
    Half,
    ThreeQuarter,
}

impl RotationAngle {
    pub fn from_degrees(degrees: i64) -> Result<Self, ConfigError> {
        match degrees {
            90 => Ok(RotationAngle::Quarter),
            180 => Ok(RotationAngle::Half),
            270 => Ok(RotationAngle::ThreeQuarter),
            other => Err(ConfigError::InvalidRotation(other.to_string())),
        }
    }

    pub fn degrees(&self) -> i64 {
        match self {
            RotationAngle::Quarter => 90,
            RotationAngle::Half => 180,
            RotationAngle::ThreeQuarter => 270,
        }
    }
}

impl FromStr for RotationAngle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let degrees = trimmed
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidRotation(trimmed.to_string()))?;
        Self::from_degrees(degrees)
    }
}

impl fmt::Display for RotationAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Rotate all pages in place, returning how many were touched
pub fn rotate_document(doc: &mut Document, angle: RotationAngle) -> usize {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut rotated = 0;

    for page_id in pages {
        let current = page_rotation(doc, page_id);
        let updated = (current + angle.degrees()).rem_euclid(360);
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Rotate", Object::Integer(updated));
            rotated += 1;
        }
    }

    rotated
}

/// Rotate every PDF in the rotate workspace
pub fn run_rotate(settings: &Settings, angle: RotationAngle) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Rotate)?;
    let output_dir = settings.output_dir(Feature::Rotate);
    let inputs = list_inputs(&settings.input_dir(Feature::Rotate), PDF_EXTENSIONS)?;

    Ok(run_batch("Rotate PDF", &inputs, |input| {
        let mut doc = document::load(&input.path)?;
        let pages = rotate_document(&mut doc, angle);
        document::save(&mut doc, &output_dir.join(&input.name))?;
        Ok(format!("{} ({} pages rotated {})", input.name, pages, angle))
    }))
}
