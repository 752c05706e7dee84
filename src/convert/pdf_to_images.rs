//! One JPEG per PDF page

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport, InputFile};
use crate::config::defaults::{PAGE_IMAGE_DPI, PAGE_IMAGE_QUALITY};
use crate::config::{Feature, Settings};
use crate::error::ToolError;
use crate::pdf::render::render_pages;

/// Output name of one rendered page
pub fn page_image_name(stem: &str, page: u32) -> String {
    format!("{}_page{}.jpg", stem, page)
}

/// Render every page of `input` into `output_dir`; returns the page count
pub fn pdf_to_images(input: &InputFile, output_dir: &Path) -> Result<u32, ToolError> {
    let stem = input.stem();
    render_pages(&input.path, PAGE_IMAGE_DPI, |page, img| {
        let path = output_dir.join(page_image_name(&stem, page));
        let mut writer = BufWriter::new(File::create(&path)?);
        JpegEncoder::new_with_quality(&mut writer, PAGE_IMAGE_QUALITY).encode_image(&img)?;
        Ok(())
    })
}

/// Render every PDF in the convert workspace to page images
pub fn run_pdf_to_images(settings: &Settings) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Convert)?;
    let output_dir = settings.output_dir(Feature::Convert);
    let inputs = list_inputs(&settings.input_dir(Feature::Convert), PDF_EXTENSIONS)?;

    Ok(run_batch("PDF to Images", &inputs, |input| {
        let pages = pdf_to_images(input, &output_dir)?;
        Ok(format!("{} -> {} page images", input.name, pages))
    }))
}
