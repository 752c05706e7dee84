//! One fully-parameterized run of a feature

use std::fmt;

use crate::batch::BatchReport;
use crate::compress::{
    run_image_compression, run_pdf_compression, CompressionLevel, CompressionTarget,
};
use crate::config::defaults::{DEFAULT_IMAGES_PDF_NAME, DEFAULT_MERGED_NAME};
use crate::config::Settings;
use crate::convert::{run_excel_to_pdf, run_images_to_pdf, run_pdf_to_images, run_word_to_pdf};
use crate::error::ToolError;
use crate::pdf::{run_merge, run_rotate, run_split, PageRange, RotationAngle};
use crate::watermark::run_watermark;

/// A feature with its parameters, ready to run against a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Watermark { text: Option<String> },
    Merge { name: Option<String> },
    Split { pages: Option<Vec<PageRange>> },
    CompressPdf { level: CompressionLevel, rasterize: bool },
    CompressImage { target: CompressionTarget },
    Rotate { angle: RotationAngle },
    ImagesToPdf { name: Option<String> },
    PdfToImages,
    WordToPdf,
    ExcelToPdf,
}

/// Output file names always end up as PDFs
fn pdf_name(name: Option<&str>, default: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if n.to_ascii_lowercase().ends_with(".pdf") => n.to_string(),
        Some(n) => format!("{}.pdf", n),
        None => default.to_string(),
    }
}

impl Task {
    pub fn run(&self, settings: &Settings) -> Result<BatchReport, ToolError> {
        log::info!("Running {} in {}", self, settings.workspace().display());
        match self {
            Task::Watermark { text } => run_watermark(settings, text.as_deref()),
            Task::Merge { name } => {
                run_merge(settings, &pdf_name(name.as_deref(), DEFAULT_MERGED_NAME))
            }
            Task::Split { pages } => run_split(settings, pages.as_deref()),
            Task::CompressPdf { level, rasterize } => {
                run_pdf_compression(settings, *level, *rasterize)
            }
            Task::CompressImage { target } => run_image_compression(settings, target),
            Task::Rotate { angle } => run_rotate(settings, *angle),
            Task::ImagesToPdf { name } => {
                run_images_to_pdf(settings, &pdf_name(name.as_deref(), DEFAULT_IMAGES_PDF_NAME))
            }
            Task::PdfToImages => run_pdf_to_images(settings),
            Task::WordToPdf => run_word_to_pdf(settings),
            Task::ExcelToPdf => run_excel_to_pdf(settings),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Watermark { .. } => write!(f, "watermark"),
            Task::Merge { .. } => write!(f, "merge"),
            Task::Split { .. } => write!(f, "split"),
            Task::CompressPdf { level, rasterize } => {
                write!(f, "PDF compression (level {}", level)?;
                if *rasterize {
                    write!(f, ", rasterized")?;
                }
                write!(f, ")")
            }
            Task::CompressImage { target } => {
                write!(f, "image compression (max {} KB)", target.max_size_kb)
            }
            Task::Rotate { angle } => write!(f, "rotate {}", angle),
            Task::ImagesToPdf { .. } => write!(f, "images to PDF"),
            Task::PdfToImages => write!(f, "PDF to images"),
            Task::WordToPdf => write!(f, "Word to PDF"),
            Task::ExcelToPdf => write!(f, "Excel to PDF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_name() {
        assert_eq!(pdf_name(None, "merged.pdf"), "merged.pdf");
        assert_eq!(pdf_name(Some("  "), "merged.pdf"), "merged.pdf");
        assert_eq!(pdf_name(Some("report"), "merged.pdf"), "report.pdf");
        assert_eq!(pdf_name(Some("Report.PDF"), "merged.pdf"), "Report.PDF");
    }

    #[test]
    fn test_run_on_empty_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());

        let report = Task::Merge { name: None }.run(&settings).unwrap();
        assert!(report.is_empty());
        assert!(dir.path().join("merge").join("input").is_dir());
        assert!(dir.path().join("merge").join("output").is_dir());
    }
}
