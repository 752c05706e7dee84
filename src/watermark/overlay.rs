//! Drawing watermark overlays onto existing PDF pages
//!
//! The page's own content is wrapped in `q … Q` so whatever graphics state it
//! leaves behind cannot leak into the overlay, then the overlay stream is
//! appended last so it paints on top.

use std::path::Path;

use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::ToolError;
use crate::model::PageGeometry;
use crate::pdf::document::{inherited_attribute, real, resolve};
use crate::pdf::text_metrics::{to_drawable, StandardFont};

/// Resource names used by the overlay stream
pub const FONT_RESOURCE: &str = "WmF1";
pub const GSTATE_RESOURCE: &str = "WmGs1";
pub const IMAGE_RESOURCE: &str = "WmIm1";

/// Text watermark appearance
pub const TEXT_FONT: StandardFont = StandardFont::HelveticaBold;
pub const TEXT_SIZE_FACTOR: f64 = 0.07;
pub const TEXT_GRAY: f64 = 0.5;
pub const TEXT_OPACITY: f64 = 0.2;
pub const TEXT_ANGLE_DEGREES: f64 = 45.0;

/// A decoded watermark template ready to embed
#[derive(Debug, Clone)]
pub struct TemplateImage {
    pub width: u32,
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl TemplateImage {
    pub fn from_image(img: &DynamicImage) -> Self {
        let alpha = if img.color().has_alpha() {
            Some(img.to_rgba8().pixels().map(|p| p.0[3]).collect())
        } else {
            None
        };
        let rgb = img.to_rgb8();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            rgb: rgb.into_raw(),
            alpha,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ToolError> {
        let img = image::open(path)?;
        Ok(Self::from_image(&img))
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    /// Add the image (and its soft mask) to `doc`, returning the XObject id
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let width = self.width as i64;
        let height = self.height as i64;

        let smask_id = self.alpha.as_ref().map(|alpha| {
            doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha.clone(),
            ))
        });

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if let Some(id) = smask_id {
            dict.set("SMask", id);
        }
        doc.add_object(Stream::new(dict, self.rgb.clone()))
    }
}

/// Scale an image to cover the page while keeping its aspect ratio
pub fn cover_fit(
    image_width: f64,
    image_height: f64,
    page_width: f64,
    page_height: f64,
) -> (f64, f64) {
    let ratio = image_width / image_height.max(1.0);
    if ratio < page_width / page_height.max(1.0) {
        (page_width, page_width / ratio)
    } else {
        (page_height * ratio, page_height)
    }
}

/// Operations drawing `template` centered over `page`
pub fn image_operations(template: &TemplateImage, page: &PageGeometry) -> Vec<Operation> {
    let (new_w, new_h) = cover_fit(
        template.width as f64,
        template.height as f64,
        page.width(),
        page.height(),
    );
    let (ox, oy) = page.origin();
    let x = ox + (page.width() - new_w) / 2.0;
    let y = oy + (page.height() - new_h) / 2.0;

    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![real(new_w), real(0.0), real(0.0), real(new_h), real(x), real(y)],
        ),
        Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Operations drawing `text` diagonally across the middle of `page`
pub fn text_operations(text: &str, page: &PageGeometry) -> Vec<Operation> {
    let text = to_drawable(text);
    let font_size = page.width().min(page.height()) * TEXT_SIZE_FACTOR;
    let text_width = TEXT_FONT.measure_width_pt(&text, font_size);
    let (cx, cy) = page.center();
    let (sin, cos) = TEXT_ANGLE_DEGREES.to_radians().sin_cos();

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(GSTATE_RESOURCE.as_bytes().to_vec())]),
        Operation::new("rg", vec![real(TEXT_GRAY), real(TEXT_GRAY), real(TEXT_GRAY)]),
        Operation::new(
            "cm",
            vec![real(1.0), real(0.0), real(0.0), real(1.0), real(cx), real(cy)],
        ),
        Operation::new(
            "cm",
            vec![real(cos), real(sin), real(-sin), real(cos), real(0.0), real(0.0)],
        ),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), real(font_size)],
        ),
        Operation::new("Td", vec![real(-text_width / 2.0), real(0.0)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

pub fn font_dictionary() -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => TEXT_FONT.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

pub fn transparency_state() -> Dictionary {
    dictionary! {
        "Type" => "ExtGState",
        "ca" => real(TEXT_OPACITY),
        "CA" => real(TEXT_OPACITY),
    }
}

/// The page's resources as a standalone dictionary, resolving inheritance
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, &obj).and_then(|o| o.as_dict().ok()).cloned())
        .unwrap_or_else(Dictionary::new)
}

fn add_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    name: &str,
    value: Object,
) {
    let mut entries = resources
        .get(category)
        .ok()
        .and_then(|obj| resolve(doc, obj))
        .and_then(|obj| obj.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    entries.set(name, value);
    resources.set(category.to_vec(), entries);
}

/// The page's content stream references, in drawing order
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, ToolError> {
    let page = doc.get_dictionary(page_id)?;
    Ok(match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    })
}

/// A resource the overlay needs: (category, name, value)
pub type OverlayResource<'a> = (&'a [u8], &'a str, Object);

/// Paint `operations` on top of the page's existing content
pub fn append_overlay(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
    overlay_resources: Vec<OverlayResource<'_>>,
) -> Result<(), ToolError> {
    let mut resources = effective_resources(doc, page_id);
    for (category, name, value) in overlay_resources {
        add_resource(doc, &mut resources, category, name, value);
    }

    let existing = content_refs(doc, page_id)?;

    let mut overlay = vec![Operation::new("Q", vec![])];
    overlay.extend(operations);
    let overlay_bytes = Content {
        operations: overlay,
    }
    .encode()?;

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay_bytes));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    let page = doc.get_dictionary_mut(page_id)?;
    page.set("Contents", contents);
    page.set("Resources", resources);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::test_support::{sample_document, to_bytes};
    use image::{Rgba, RgbaImage};

    fn value(obj: &Object) -> f64 {
        match obj {
            Object::Real(r) => *r as f64,
            Object::Integer(i) => *i as f64,
            other => panic!("not a number: {:?}", other),
        }
    }

    #[test]
    fn test_cover_fit() {
        // Wide image on portrait page: height fills, width overflows
        let (w, h) = cover_fit(200.0, 100.0, 595.0, 842.0);
        assert_eq!(h, 842.0);
        assert_eq!(w, 1684.0);

        // Tall image on landscape page: width fills
        let (w, h) = cover_fit(100.0, 200.0, 842.0, 595.0);
        assert_eq!(w, 842.0);
        assert_eq!(h, 1684.0);
    }

    #[test]
    fn test_text_operations_centered() {
        let page = PageGeometry::from_size(600.0, 800.0);
        let ops = text_operations("TOP SECRET", &page);

        let translate = ops.iter().find(|op| op.operator == "cm").unwrap();
        assert_eq!(value(&translate.operands[4]), 300.0);
        assert_eq!(value(&translate.operands[5]), 400.0);

        let tf = ops.iter().find(|op| op.operator == "Tf").unwrap();
        assert!((value(&tf.operands[1]) - 42.0).abs() < 1e-3);
    }

    #[test]
    fn test_template_alpha_split() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 10]));
        let template = TemplateImage::from_image(&DynamicImage::ImageRgba8(img));
        assert!(template.has_alpha());
        assert_eq!(template.alpha.as_ref().unwrap()[0], 10);
        assert_eq!(&template.rgb[0..3], &[255, 0, 0]);
    }

    #[test]
    fn test_append_overlay_wraps_content() {
        let mut doc = sample_document(&[(595, 842)]);
        let page_id = *doc.get_pages().get(&1).unwrap();
        let font_id = doc.add_object(font_dictionary());

        append_overlay(
            &mut doc,
            page_id,
            text_operations("DRAFT", &PageGeometry::from_size(595.0, 842.0)),
            vec![(b"Font".as_slice(), FONT_RESOURCE, Object::Reference(font_id))],
        )
        .unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        let contents = page.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 3);

        let fonts = page
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"Font")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(FONT_RESOURCE.as_bytes()));

        let content = doc.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with("q\n"));
        assert!(text.contains("(DRAFT) Tj"));

        let reloaded = Document::load_mem(&to_bytes(&mut doc)).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }
}
