//! Small lopdf helpers shared by the PDF features

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::ToolError;
use crate::model::PageGeometry;

/// Page attributes a page may inherit from its ancestors in the page tree
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Upper bound on page-tree depth, guards against Parent cycles
const MAX_TREE_DEPTH: usize = 64;

pub fn load(path: &Path) -> Result<Document, ToolError> {
    Ok(Document::load(path)?)
}

pub fn save(doc: &mut Document, path: &Path) -> Result<(), ToolError> {
    doc.save(path)?;
    Ok(())
}

/// Build a real-number operand regardless of lopdf's float width
pub fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// Follow a reference to its target; direct objects are returned as is
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

pub fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

pub fn name_is(obj: Option<&Object>, name: &[u8]) -> bool {
    matches!(obj, Some(Object::Name(n)) if n.as_slice() == name)
}

/// Look up a page attribute on the page or, failing that, its ancestors
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy inherited attributes onto the page itself so it survives re-parenting
pub fn flatten_inherited(doc: &mut Document, page_id: ObjectId) {
    for key in INHERITABLE_KEYS {
        let present = doc
            .get_dictionary(page_id)
            .map(|page| page.has(key))
            .unwrap_or(true);
        if present {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            if let Ok(page) = doc.get_dictionary_mut(page_id) {
                page.set(key.to_vec(), value);
            }
        }
    }
}

fn rectangle(doc: &Document, obj: &Object) -> Option<PageGeometry> {
    let items = resolve(doc, obj)?.as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let mut coords = [0.0f64; 4];
    for (slot, item) in coords.iter_mut().zip(items) {
        *slot = number(doc, item)?;
    }
    Some(PageGeometry::new(coords[0], coords[1], coords[2], coords[3]))
}

/// The page's MediaBox
pub fn media_box(
    doc: &Document,
    page_id: ObjectId,
    page_number: u32,
) -> Result<PageGeometry, ToolError> {
    inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| rectangle(doc, &obj))
        .ok_or(ToolError::MissingPageBox(page_number))
}

/// The visible page area: CropBox when present, otherwise MediaBox
pub fn visible_box(
    doc: &Document,
    page_id: ObjectId,
    page_number: u32,
) -> Result<PageGeometry, ToolError> {
    match inherited_attribute(doc, page_id, b"CropBox").and_then(|obj| rectangle(doc, &obj)) {
        Some(crop) => Ok(crop),
        None => media_box(doc, page_id, page_number),
    }
}

/// Current page rotation in degrees, normalized to 0..360
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| number(doc, &obj))
        .map(|deg| (deg as i64).rem_euclid(360))
        .unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_document;
    use super::*;

    #[test]
    fn test_media_box_inherited_from_pages_node() {
        let mut doc = sample_document(&[(595, 842)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        let pages_id = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();

        let media = doc.get_dictionary_mut(page_id).unwrap().remove(b"MediaBox").unwrap();
        doc.get_dictionary_mut(pages_id).unwrap().set("MediaBox", media);

        let geom = media_box(&doc, page_id, 1).unwrap();
        assert_eq!((geom.width(), geom.height()), (595.0, 842.0));

        flatten_inherited(&mut doc, page_id);
        assert!(doc.get_dictionary(page_id).unwrap().has(b"MediaBox"));
    }

    #[test]
    fn test_crop_box_preferred() {
        let mut doc = sample_document(&[(612, 792)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        doc.get_dictionary_mut(page_id).unwrap().set(
            "CropBox",
            vec![real(10.0), real(10.0), real(605.0), real(852.0)],
        );
        let geom = visible_box(&doc, page_id, 1).unwrap();
        assert_eq!((geom.width(), geom.height()), (595.0, 842.0));
    }

    #[test]
    fn test_missing_box_is_error() {
        let mut doc = sample_document(&[(595, 842)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        doc.get_dictionary_mut(page_id).unwrap().remove(b"MediaBox");
        assert!(matches!(
            media_box(&doc, page_id, 1),
            Err(ToolError::MissingPageBox(1))
        ));
    }

    #[test]
    fn test_rotation_default_and_inherited() {
        let mut doc = sample_document(&[(595, 842)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        assert_eq!(page_rotation(&doc, page_id), 0);

        let rotate_id = doc.add_object(Object::Integer(-90));
        doc.get_dictionary_mut(page_id).unwrap().set("Rotate", rotate_id);
        assert_eq!(page_rotation(&doc, page_id), 270);
    }
}
