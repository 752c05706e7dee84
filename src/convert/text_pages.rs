//! Plain text laid out on A4 pages in a standard font
//!
//! Lines wrap at word boundaries to the text column; a word wider than the
//! column is broken between characters. A new page starts when the next
//! line would cross the bottom margin.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::ToolError;
use crate::pdf::builder::DocumentBuilder;
use crate::pdf::document::real;
use crate::pdf::text_metrics::{to_drawable, StandardFont};

const POINTS_PER_MM: f64 = 72.0 / 25.4;

pub const A4_WIDTH_PT: f64 = 210.0 * POINTS_PER_MM;
pub const A4_HEIGHT_PT: f64 = 297.0 * POINTS_PER_MM;

const FONT_RESOURCE: &str = "F1";

/// Font and spacing for a run of text pages, all lengths in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    pub font: StandardFont,
    pub font_size: f64,
    pub line_height: f64,
    /// Left, right and top margin
    pub margin: f64,
    pub bottom_margin: f64,
    /// Inset of the text from the margin on both sides
    pub padding: f64,
    /// Extra space after each paragraph
    pub paragraph_gap: f64,
}

impl TextLayout {
    /// Word documents: 11 pt Helvetica on 8 mm lines, 2 mm between
    /// paragraphs, 15 mm bottom margin
    pub fn document() -> Self {
        Self {
            font: StandardFont::Helvetica,
            font_size: 11.0,
            line_height: 8.0 * POINTS_PER_MM,
            margin: 10.0 * POINTS_PER_MM,
            bottom_margin: 15.0 * POINTS_PER_MM,
            padding: POINTS_PER_MM,
            paragraph_gap: 2.0 * POINTS_PER_MM,
        }
    }

    /// Spreadsheet rows: 10 pt Helvetica on 6 mm lines, 20 mm bottom margin
    pub fn sheet() -> Self {
        Self {
            font: StandardFont::Helvetica,
            font_size: 10.0,
            line_height: 6.0 * POINTS_PER_MM,
            margin: 10.0 * POINTS_PER_MM,
            bottom_margin: 20.0 * POINTS_PER_MM,
            padding: POINTS_PER_MM,
            paragraph_gap: 0.0,
        }
    }

    /// Width available to a line of text
    pub fn column_width(&self) -> f64 {
        A4_WIDTH_PT - 2.0 * (self.margin + self.padding)
    }

    /// Offset from the top of a line to its baseline
    fn baseline_offset(&self) -> f64 {
        0.5 * self.line_height + 0.3 * self.font_size
    }
}

/// Break `text` into lines no wider than `max_width` points.
///
/// Newlines force a break and runs of whitespace collapse to one space. An
/// empty paragraph still yields one (blank) line.
pub fn wrap_text(text: &str, font: StandardFont, font_size: f64, max_width: f64) -> Vec<String> {
    let fits = |line: &str| font.measure_width_pt(line, font_size) <= max_width;
    let mut lines = Vec::new();

    for hard_line in text.split('\n') {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{} {}", current, word);
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if !fits(&current) && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Lines positioned on one page: distance of each baseline from the top
type PageLines = Vec<(f64, String)>;

fn add_text_page(
    builder: &mut DocumentBuilder,
    resources_id: ObjectId,
    layout: &TextLayout,
    lines: &PageLines,
) -> Result<ObjectId, ToolError> {
    let x = layout.margin + layout.padding;
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(FONT_RESOURCE.as_bytes().to_vec()), real(layout.font_size)],
        ),
    ];
    for (baseline, text) in lines.iter().filter(|(_, text)| !text.is_empty()) {
        operations.push(Operation::new(
            "Tm",
            vec![
                real(1.0),
                real(0.0),
                real(0.0),
                real(1.0),
                real(x),
                real(A4_HEIGHT_PT - baseline),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(to_drawable(text))],
        ));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = builder.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(builder.add_page(dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), real(A4_WIDTH_PT), real(A4_HEIGHT_PT)],
        "Contents" => content_id,
        "Resources" => resources_id,
    }))
}

/// Lay paragraphs out top to bottom over as many A4 pages as they need.
///
/// The document always has at least one page, blank when there is no text.
pub fn layout_text(paragraphs: &[String], layout: &TextLayout) -> Result<Document, ToolError> {
    let mut builder = DocumentBuilder::new();
    let font_id = builder.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => layout.font.base_font(),
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = builder.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let page_bottom = A4_HEIGHT_PT - layout.bottom_margin;
    let mut lines: PageLines = Vec::new();
    let mut y = layout.margin;

    for paragraph in paragraphs {
        let wrapped = wrap_text(
            paragraph,
            layout.font,
            layout.font_size,
            layout.column_width(),
        );
        for line in wrapped {
            if y + layout.line_height > page_bottom && !lines.is_empty() {
                add_text_page(&mut builder, resources_id, layout, &lines)?;
                lines.clear();
                y = layout.margin;
            }
            lines.push((y + layout.baseline_offset(), line));
            y += layout.line_height;
        }
        y += layout.paragraph_gap;
    }
    add_text_page(&mut builder, resources_id, layout, &lines)?;

    builder
        .finish()
        .ok_or_else(|| ToolError::Structure("no page was produced".to_string()))
}
