//! Concatenate several PDFs into one

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{dictionary, Document, Object, ObjectId};

use crate::batch::input::PDF_EXTENSIONS;
use crate::batch::{list_inputs, BatchReport};
use crate::config::{Feature, Settings};
use crate::error::ToolError;

use super::document::{self, flatten_inherited, name_is};

fn is_structural(object: &Object) -> bool {
    match object.as_dict() {
        Ok(dict) => {
            let kind = dict.get(b"Type").ok();
            name_is(kind, b"Catalog") || name_is(kind, b"Pages")
        }
        Err(_) => false,
    }
}

/// Merge documents in order into a single document.
///
/// Each source keeps its page content and resources; its catalog and page
/// tree are replaced by one new tree covering every page.
pub fn merge_documents(documents: Vec<Document>) -> Result<Document, ToolError> {
    if documents.is_empty() {
        return Err(ToolError::Structure("nothing to merge".to_string()));
    }

    let mut next_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for mut doc in documents {
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for page_id in &pages {
            flatten_inherited(&mut doc, *page_id);
        }

        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        page_ids.extend(doc.get_pages().into_values());
        objects.extend(
            doc.objects
                .into_iter()
                .filter(|(_, object)| !is_structural(object)),
        );
    }

    let mut merged = Document::with_version("1.5");
    merged.objects = objects;
    merged.max_id = next_id;

    let pages_id = merged.new_object_id();
    for page_id in &page_ids {
        if let Ok(page) = merged.get_dictionary_mut(*page_id) {
            page.set("Parent", pages_id);
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}

/// Merge every PDF in the merge workspace into `output_name`
pub fn run_merge(settings: &Settings, output_name: &str) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Merge)?;
    let inputs = list_inputs(&settings.input_dir(Feature::Merge), PDF_EXTENSIONS)?;
    let mut report = BatchReport::new("Merge PDF");

    if inputs.is_empty() {
        log::warn!("Merge PDF: no input files");
        return Ok(report);
    }

    let mut documents = Vec::new();
    let mut loaded = Vec::new();
    for input in &inputs {
        match document::load(&input.path) {
            Ok(doc) => {
                let pages = doc.get_pages().len();
                log::info!("Merge PDF: {} ({} pages)", input.name, pages);
                loaded.push((input.name.clone(), pages));
                documents.push(doc);
            }
            Err(e) => {
                log::warn!("Merge PDF: skipping {}: {}", input.name, e);
                report.record_failure(&input.name, e.to_string());
            }
        }
    }

    if documents.is_empty() {
        return Ok(report);
    }

    let mut merged = merge_documents(documents)?;
    let output_path = settings.output_dir(Feature::Merge).join(output_name);
    write_merged(&mut merged, &output_path)?;

    for (name, pages) in loaded {
        report.record_done(&name, format!("{} ({} pages) -> {}", name, pages, output_name));
    }
    Ok(report)
}

fn write_merged(doc: &mut Document, path: &Path) -> Result<(), ToolError> {
    document::save(doc, path)?;
    log::info!("Merge PDF: wrote {}", path.display());
    Ok(())
}
