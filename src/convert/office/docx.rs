//! Paragraph text from Word `.docx` files

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ToolError;

use super::{open_archive, read_part};

const DOCUMENT_PART: &str = "word/document.xml";

/// Body paragraphs of a `.docx`, in document order
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>, ToolError> {
    let mut archive = open_archive(path)?;
    let xml = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| ToolError::MissingPart {
        file: path.display().to_string(),
        part: DOCUMENT_PART.to_string(),
    })?;
    parse_paragraphs(&xml)
}

/// Paragraph texts from `word/document.xml`.
///
/// Only top-level body paragraphs count; table cells and paragraphs nested in
/// text boxes are skipped. Tabs and line breaks inside a run are kept.
pub fn parse_paragraphs(xml: &str) -> Result<Vec<String>, ToolError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut table_depth = 0usize;
    let mut paragraph_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth += 1,
                b"p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        current.clear();
                    }
                }
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                let collecting = table_depth == 0 && paragraph_depth == 1;
                match e.local_name().as_ref() {
                    b"p" if table_depth == 0 && paragraph_depth == 0 => {
                        paragraphs.push(String::new())
                    }
                    b"tab" if collecting => current.push('\t'),
                    b"br" | b"cr" if collecting => current.push('\n'),
                    _ => {}
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"tbl" => table_depth = table_depth.saturating_sub(1),
                b"p" => {
                    if paragraph_depth == 1 && table_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"t" => in_text = false,
                _ => {}
            },
            Event::Text(e) if in_text && table_depth == 0 && paragraph_depth == 1 => {
                current.push_str(&e.unescape()?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
