//! Split PDFs into page ranges

use std::path::Path;

use lopdf::Document;

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport, InputFile};
use crate::config::{Feature, Settings};
use crate::error::ToolError;

use super::document;
use super::range::PageRange;

/// Extract the pages in `range` into a new document
pub fn extract_range(doc: &Document, range: PageRange) -> Document {
    let to_delete: Vec<u32> = doc
        .get_pages()
        .keys()
        .copied()
        .filter(|page| !range.contains(*page))
        .collect();

    let mut part = doc.clone();
    part.delete_pages(&to_delete);
    part.prune_objects();
    part.renumber_objects();
    part.compress();
    part
}

/// Resolve the requested ranges against the document's page count.
///
/// With no selection every page becomes its own range.
pub fn plan_ranges(selection: Option<&[PageRange]>, page_count: u32) -> Vec<PageRange> {
    match selection {
        None => (1..=page_count).map(PageRange::single).collect(),
        Some(ranges) => ranges
            .iter()
            .filter_map(|range| {
                let clipped = range.clip(page_count);
                if clipped.is_none() {
                    log::warn!(
                        "pages {} are beyond the last page ({}), skipping",
                        range,
                        page_count
                    );
                }
                clipped
            })
            .collect(),
    }
}

/// Split one PDF into `output_dir`
pub fn split_file(
    input: &InputFile,
    output_dir: &Path,
    selection: Option<&[PageRange]>,
) -> Result<String, ToolError> {
    let doc = document::load(&input.path)?;
    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(ToolError::Structure("document has no pages".to_string()));
    }

    let ranges = plan_ranges(selection, page_count);
    if ranges.is_empty() {
        return Err(ToolError::Structure(format!(
            "no requested pages within 1-{}",
            page_count
        )));
    }

    let stem = input.stem();
    let mut written = Vec::new();
    for range in ranges {
        let mut part = extract_range(&doc, range);
        let name = format!("{}_{}.pdf", stem, range.label());
        document::save(&mut part, &output_dir.join(&name))?;
        log::debug!("{}: wrote {}", input.name, name);
        written.push(name);
    }

    Ok(format!(
        "{} ({} pages) -> {} files",
        input.name,
        page_count,
        written.len()
    ))
}

/// Split every PDF in the split workspace
pub fn run_split(
    settings: &Settings,
    selection: Option<&[PageRange]>,
) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Split)?;
    let output_dir = settings.output_dir(Feature::Split);
    let inputs = list_inputs(&settings.input_dir(Feature::Split), PDF_EXTENSIONS)?;

    Ok(run_batch("Split PDF", &inputs, |input| {
        split_file(input, &output_dir, selection)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::test_support::{sample_document, to_bytes};

    #[test]
    fn test_extract_range() {
        let doc = sample_document(&[(595, 842), (842, 595), (595, 935)]);
        let mut part = extract_range(&doc, PageRange::new(2, 3));
        let pages = part.get_pages();
        assert_eq!(pages.len(), 2);

        let first = *pages.get(&1).unwrap();
        let geom = document::media_box(&part, first, 1).unwrap();
        assert_eq!(geom.width(), 842.0);

        let reloaded = Document::load_mem(&to_bytes(&mut part)).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
    }

    #[test]
    fn test_plan_ranges() {
        assert_eq!(
            plan_ranges(None, 3),
            vec![PageRange::single(1), PageRange::single(2), PageRange::single(3)]
        );

        let requested = [PageRange::new(2, 10), PageRange::single(7)];
        assert_eq!(plan_ranges(Some(&requested), 4), vec![PageRange::new(2, 4)]);
    }
}
