//! PDF watermarking
//!
//! Each page is classified by paper format and receives the matching template
//! image from the workspace's template folder. Pages whose template is
//! missing get a diagonal text watermark instead.

pub mod classify;
pub mod overlay;

pub use classify::{classify, detect, detect_bucket};
pub use overlay::TemplateImage;

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport};
use crate::config::defaults::DEFAULT_WATERMARK_TEXT;
use crate::config::{Feature, Settings};
use crate::error::ToolError;
use crate::model::FormatLabel;
use crate::pdf::document::{self, media_box, visible_box};

use overlay::{
    append_overlay, font_dictionary, image_operations, text_operations, transparency_state,
    FONT_RESOURCE, GSTATE_RESOURCE, IMAGE_RESOURCE,
};

/// Watermark images keyed by the page format they apply to
#[derive(Debug, Clone, Default)]
pub struct Templates {
    images: HashMap<FormatLabel, TemplateImage>,
}

impl Templates {
    /// Load whichever of the four template files exist in `dir`.
    ///
    /// Unreadable templates are logged and left out.
    pub fn load(dir: &Path) -> Self {
        let mut images = HashMap::new();
        for label in FormatLabel::all() {
            let path = dir.join(label.template_file());
            if !path.is_file() {
                continue;
            }
            match TemplateImage::load(&path) {
                Ok(template) => {
                    log::info!("Loaded {} template {}", label, path.display());
                    images.insert(label, template);
                }
                Err(e) => log::warn!("Ignoring template {}: {}", path.display(), e),
            }
        }
        Self { images }
    }

    pub fn insert(&mut self, label: FormatLabel, template: TemplateImage) {
        self.images.insert(label, template);
    }

    pub fn get(&self, label: FormatLabel) -> Option<&TemplateImage> {
        self.images.get(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// True if any template file is present in `dir`
pub fn templates_present(dir: &Path) -> bool {
    FormatLabel::all()
        .iter()
        .any(|label| dir.join(label.template_file()).is_file())
}

/// How the pages of one document were watermarked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatermarkStats {
    pub image_pages: usize,
    pub text_pages: usize,
    pub labels: Vec<FormatLabel>,
}

impl WatermarkStats {
    pub fn pages(&self) -> usize {
        self.image_pages + self.text_pages
    }
}

/// Watermark every page of `doc` in place
pub fn watermark_document(
    doc: &mut Document,
    templates: &Templates,
    text: &str,
) -> Result<WatermarkStats, ToolError> {
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let mut stats = WatermarkStats::default();

    let mut embedded: HashMap<FormatLabel, ObjectId> = HashMap::new();
    let mut font_id: Option<ObjectId> = None;
    let mut gstate_id: Option<ObjectId> = None;

    for (number, page_id) in pages {
        let label = classify(&visible_box(doc, page_id, number)?);
        let media = media_box(doc, page_id, number)?;
        log::debug!("page {}: {}", number, label);
        stats.labels.push(label);

        match templates.get(label) {
            Some(template) => {
                let xobject = *embedded
                    .entry(label)
                    .or_insert_with(|| template.embed(doc));
                append_overlay(
                    doc,
                    page_id,
                    image_operations(template, &media),
                    vec![(b"XObject".as_slice(), IMAGE_RESOURCE, Object::Reference(xobject))],
                )?;
                stats.image_pages += 1;
            }
            None => {
                let font = *font_id.get_or_insert_with(|| doc.add_object(font_dictionary()));
                let gstate =
                    *gstate_id.get_or_insert_with(|| doc.add_object(transparency_state()));
                append_overlay(
                    doc,
                    page_id,
                    text_operations(text, &media),
                    vec![
                        (b"Font".as_slice(), FONT_RESOURCE, Object::Reference(font)),
                        (b"ExtGState".as_slice(), GSTATE_RESOURCE, Object::Reference(gstate)),
                    ],
                )?;
                stats.text_pages += 1;
            }
        }
    }

    doc.compress();
    Ok(stats)
}

/// Watermark every PDF in the watermark workspace.
///
/// `text` is used for pages without a matching template; it defaults to
/// "WATERMARK".
pub fn run_watermark(settings: &Settings, text: Option<&str>) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Watermark)?;
    let output_dir = settings.output_dir(Feature::Watermark);
    let inputs = list_inputs(&settings.input_dir(Feature::Watermark), PDF_EXTENSIONS)?;

    let templates = Templates::load(&settings.template_dir());
    if templates.is_empty() {
        log::info!("No templates found, using text watermark");
    }
    let text = text
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_WATERMARK_TEXT);

    Ok(run_batch("Watermark PDF", &inputs, |input| {
        let mut doc = document::load(&input.path)?;
        let stats = watermark_document(&mut doc, &templates, text)?;
        document::save(&mut doc, &output_dir.join(&input.name))?;
        Ok(format!(
            "{} ({} pages: {} template, {} text)",
            input.name,
            stats.pages(),
            stats.image_pages,
            stats.text_pages
        ))
    }))
}
