//! Cell text from the active sheet of Excel `.xlsx` files

use std::fs::File;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::error::ToolError;

use super::{attribute, open_archive, read_part};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FIRST_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Cells of one row joined the way they are printed
pub fn row_line(row: &[String]) -> String {
    row.join(" | ")
}

/// Rows of the workbook's active sheet as text.
///
/// Every row is padded to the widest row, and rows missing from the sheet
/// come back empty, so positions match the spreadsheet grid from A1.
pub fn read_rows(path: &Path) -> Result<Vec<Vec<String>>, ToolError> {
    let mut archive = open_archive(path)?;
    let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_part = active_sheet_part(&mut archive)?;
    let xml = read_part(&mut archive, &sheet_part)?.ok_or_else(|| ToolError::MissingPart {
        file: path.display().to_string(),
        part: sheet_part.clone(),
    })?;
    parse_sheet(&xml, &shared)
}

/// Archive path of the sheet the workbook opens on, falling back to the
/// first worksheet when the workbook does not say
fn active_sheet_part(archive: &mut ZipArchive<File>) -> Result<String, ToolError> {
    let Some(workbook) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(FIRST_SHEET_PART.to_string());
    };
    let Some(relation) = active_sheet_relation(&workbook)? else {
        return Ok(FIRST_SHEET_PART.to_string());
    };
    let Some(rels) = read_part(archive, WORKBOOK_RELS_PART)? else {
        return Ok(FIRST_SHEET_PART.to_string());
    };
    Ok(relation_target(&rels, &relation)?.unwrap_or_else(|| FIRST_SHEET_PART.to_string()))
}

/// Relationship id of the sheet at the workbook view's `activeTab`
fn active_sheet_relation(workbook: &str) -> Result<Option<String>, ToolError> {
    let mut reader = Reader::from_str(workbook);
    let mut active_tab = 0usize;
    let mut sheets = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"workbookView" => {
                    if let Some(tab) = attribute(&e, b"activeTab").and_then(|v| v.parse().ok()) {
                        active_tab = tab;
                    }
                }
                b"sheet" => sheets.push(attribute(&e, b"id")),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(sheets.into_iter().nth(active_tab).flatten())
}

/// Resolve a workbook relationship id to an archive path
fn relation_target(rels: &str, id: &str) -> Result<Option<String>, ToolError> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if attribute(&e, b"Id").as_deref() != Some(id) {
                    continue;
                }
                return Ok(attribute(&e, b"Target").map(|target| {
                    match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    }
                }));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// The shared string table; rich-text runs are concatenated and phonetic
/// hints dropped
pub fn parse_shared_strings(xml: &str) -> Result<Vec<String>, ToolError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Text(e) if in_text && !in_phonetic => current.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(strings)
}

/// Zero-based column of a cell reference such as `AB12`
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(number - 1)
}

/// One `<c>` element while it is being read
struct Cell {
    column: usize,
    kind: Option<String>,
    value: String,
}

impl Cell {
    fn text(self, shared: &[String]) -> String {
        match self.kind.as_deref() {
            Some("s") => self
                .value
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared.get(index).cloned())
                .unwrap_or_default(),
            Some("b") => match self.value.trim() {
                "1" => "True".to_string(),
                _ => "False".to_string(),
            },
            _ => self.value,
        }
    }
}

fn place(row: &mut Vec<String>, column: usize, text: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = text;
}

/// Zero-based row index from a `<row r="..">` element, or `next` without one
fn row_index(row: &BytesStart, next: usize) -> usize {
    attribute(row, b"r")
        .and_then(|r| r.parse::<usize>().ok())
        .filter(|&r| r > 0)
        .map(|r| r - 1)
        .unwrap_or(next)
}

/// Rows of a worksheet part, resolved against the shared string table
pub fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, ToolError> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Option<(usize, Vec<String>)> = None;
    let mut cell: Option<Cell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => row = Some((row_index(&e, rows.len()), Vec::new())),
                b"c" => {
                    let next_column = row.as_ref().map(|(_, cells)| cells.len()).unwrap_or(0);
                    cell = Some(Cell {
                        column: attribute(&e, b"r")
                            .and_then(|r| column_index(&r))
                            .unwrap_or(next_column),
                        kind: attribute(&e, b"t"),
                        value: String::new(),
                    });
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                let index = row_index(&e, rows.len());
                if rows.len() <= index {
                    rows.resize(index + 1, Vec::new());
                }
            }
            Event::Text(e) if in_value => {
                if let Some(cell) = cell.as_mut() {
                    cell.value.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(done), Some((_, cells))) = (cell.take(), row.as_mut()) {
                        let column = done.column;
                        place(cells, column, done.text(shared));
                    }
                }
                b"row" => {
                    if let Some((index, cells)) = row.take() {
                        if rows.len() <= index {
                            rows.resize(index + 1, Vec::new());
                        }
                        rows[index] = cells;
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    Ok(rows)
}
