//! Word and Excel documents rendered as plain text pages
//!
//! Both formats are ZIP archives of XML parts. Only the text is carried
//! over: styling, images and charts are dropped.

pub mod docx;
pub mod xlsx;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::BytesStart;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::batch::{list_inputs, run_batch, BatchReport};
use crate::config::{Feature, Settings};
use crate::error::ToolError;
use crate::pdf::document;

use super::text_pages::{layout_text, TextLayout};

pub use docx::read_paragraphs;
pub use xlsx::{read_rows, row_line};

pub const WORD_EXTENSIONS: &[&str] = &["docx"];
pub const EXCEL_EXTENSIONS: &[&str] = &["xlsx"];

pub(crate) fn open_archive(path: &Path) -> Result<ZipArchive<File>, ToolError> {
    Ok(ZipArchive::new(File::open(path)?)?)
}

/// Read an archive member as text; `None` when the archive has no such part
pub(crate) fn read_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> Result<Option<String>, ToolError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

/// Value of the attribute whose local name is `key`, namespace ignored
pub(crate) fn attribute(element: &BytesStart, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .filter_map(|attr| attr.ok())
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|value| value.into_owned()))
}

/// Lay out `paragraphs` and save them as `<stem>.pdf` in the convert output
fn write_text_pdf(
    settings: &Settings,
    stem: &str,
    paragraphs: &[String],
    layout: &TextLayout,
) -> Result<String, ToolError> {
    let mut doc = layout_text(paragraphs, layout)?;
    let pages = doc.get_pages().len();
    let name = format!("{}.pdf", stem);
    document::save(&mut doc, &settings.output_dir(Feature::Convert).join(&name))?;
    Ok(format!("{} ({} pages)", name, pages))
}

/// Convert every `.docx` in the convert workspace to a PDF of its paragraphs
pub fn run_word_to_pdf(settings: &Settings) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Convert)?;
    let inputs = list_inputs(&settings.input_dir(Feature::Convert), WORD_EXTENSIONS)?;
    let layout = TextLayout::document();

    Ok(run_batch("Word to PDF", &inputs, |input| {
        let paragraphs = read_paragraphs(&input.path)?;
        let written = write_text_pdf(settings, &input.stem(), &paragraphs, &layout)?;
        Ok(format!("{} -> {}", input.name, written))
    }))
}

/// Convert every `.xlsx` in the convert workspace to a PDF listing the active
/// sheet's rows, cells joined by ` | `
pub fn run_excel_to_pdf(settings: &Settings) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Convert)?;
    let inputs = list_inputs(&settings.input_dir(Feature::Convert), EXCEL_EXTENSIONS)?;
    let layout = TextLayout::sheet();

    Ok(run_batch("Excel to PDF", &inputs, |input| {
        let lines: Vec<String> = read_rows(&input.path)?
            .iter()
            .map(|row| row_line(row))
            .collect();
        let written = write_text_pdf(settings, &input.stem(), &lines, &layout)?;
        Ok(format!("{} -> {}", input.name, written))
    }))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// Write a ZIP archive holding the given `(name, contents)` parts
    pub fn write_archive(path: &Path, parts: &[(&str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, contents) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
}
