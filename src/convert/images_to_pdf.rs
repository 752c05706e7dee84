//! Turn a folder of images into one PDF, one full-bleed page per image

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::batch::input::CONVERTIBLE_IMAGE_EXTENSIONS;
use crate::batch::{list_inputs, BatchReport, InputFile};
use crate::compress::image::{flatten_onto_white, load_upright};
use crate::config::defaults::EMBED_JPEG_QUALITY;
use crate::config::{Feature, Settings};
use crate::error::ToolError;
use crate::pdf::builder::DocumentBuilder;
use crate::pdf::document;

const IMAGE_RESOURCE: &str = "Im0";

fn is_white(pixel: &image::Rgb<u8>) -> bool {
    pixel.0 == [255, 255, 255]
}

/// Crop away rows and columns that are entirely white.
///
/// An all-white image is returned unchanged.
pub fn trim_white_margins(img: RgbImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let mut left = width;
    let mut right = 0;
    let mut top = height;
    let mut bottom = 0;

    for (x, y, pixel) in img.enumerate_pixels() {
        if !is_white(pixel) {
            left = left.min(x);
            right = right.max(x);
            top = top.min(y);
            bottom = bottom.max(y);
        }
    }

    if left > right || top > bottom {
        return img;
    }
    if left == 0 && top == 0 && right == width - 1 && bottom == height - 1 {
        return img;
    }
    img.view(left, top, right - left + 1, bottom - top + 1).to_image()
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ToolError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(img)?;
    Ok(buf.into_inner())
}

/// Add `img` as a full-bleed page of `width` x `height` points.
///
/// The image is embedded as a DCT-encoded XObject at `quality`.
pub fn add_image_page(
    builder: &mut DocumentBuilder,
    img: &RgbImage,
    quality: u8,
    (width, height): (f64, f64),
) -> Result<ObjectId, ToolError> {
    let (pixel_width, pixel_height) = img.dimensions();
    let jpeg = encode_jpeg(img, quality)?;

    // Already JPEG: keep lopdf from flate-compressing it again
    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => pixel_width as i64,
            "Height" => pixel_height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    .with_compression(false);
    let image_id = builder.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    document::real(width),
                    document::real(0.0),
                    document::real(0.0),
                    document::real(height),
                    document::real(0.0),
                    document::real(0.0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = builder.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(builder.add_page(dictionary! {
        "MediaBox" => vec![0.into(), 0.into(), document::real(width), document::real(height)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { IMAGE_RESOURCE => image_id },
        },
    }))
}

/// Build a PDF with one page per readable image, in the given order.
///
/// Pages are the image's pixel size in points. Returns `None` for the
/// document when no image could be read.
pub fn images_to_pdf(inputs: &[InputFile], title: &str) -> (Option<Document>, BatchReport) {
    let mut report = BatchReport::new(title);
    let mut builder = DocumentBuilder::new();

    for input in inputs {
        let page = load_upright(&input.path)
            .map(|img| trim_white_margins(flatten_onto_white(&img)))
            .and_then(|rgb| {
                let (w, h) = rgb.dimensions();
                add_image_page(&mut builder, &rgb, EMBED_JPEG_QUALITY, (w as f64, h as f64))
                    .map(|_| (w, h))
            });
        match page {
            Ok((w, h)) => {
                let number = builder.page_count();
                log::info!("{}: page {} from {} ({}x{})", title, number, input.name, w, h);
                report.record_done(
                    &input.name,
                    format!("{} -> page {} ({}x{} pt)", input.name, number, w, h),
                );
            }
            Err(e) => {
                log::warn!("{}: skipping {}: {}", title, input.name, e);
                report.record_failure(&input.name, e.to_string());
            }
        }
    }

    (builder.finish(), report)
}

/// Convert every image in the convert workspace into `output_name`
pub fn run_images_to_pdf(
    settings: &Settings,
    output_name: &str,
) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Convert)?;
    let inputs = list_inputs(
        &settings.input_dir(Feature::Convert),
        CONVERTIBLE_IMAGE_EXTENSIONS,
    )?;
    if inputs.is_empty() {
        log::warn!("Images to PDF: no input files");
        return Ok(BatchReport::new("Images to PDF"));
    }

    let (doc, report) = images_to_pdf(&inputs, "Images to PDF");
    if let Some(mut doc) = doc {
        let path = settings.output_dir(Feature::Convert).join(output_name);
        document::save(&mut doc, &path)?;
        log::info!("Images to PDF: wrote {}", path.display());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn framed(width: u32, height: u32, inner: (u32, u32, u32, u32)) -> RgbImage {
        let (x0, y0, x1, y1) = inner;
        RgbImage::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Rgb([20, 40, 60])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_trim_white_margins() {
        let trimmed = trim_white_margins(framed(100, 80, (10, 5, 60, 45)));
        assert_eq!(trimmed.dimensions(), (50, 40));
        assert_eq!(trimmed.get_pixel(0, 0).0, [20, 40, 60]);
    }

    #[test]
    fn test_trim_keeps_blank_and_full_images() {
        let blank = RgbImage::from_pixel(30, 20, Rgb([255, 255, 255]));
        assert_eq!(trim_white_margins(blank).dimensions(), (30, 20));

        let full = RgbImage::from_pixel(30, 20, Rgb([0, 0, 0]));
        assert_eq!(trim_white_margins(full).dimensions(), (30, 20));
    }

    #[test]
    fn test_page_matches_pixel_size() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        let broken = dir.path().join("c.png");
        framed(120, 90, (0, 0, 120, 90)).save(&a).unwrap();
        framed(64, 64, (8, 8, 40, 56)).save(&b).unwrap();
        std::fs::write(&broken, b"garbage").unwrap();

        let inputs: Vec<InputFile> = [a, b, broken]
            .into_iter()
            .filter_map(InputFile::from_path)
            .collect();
        let (doc, report) = images_to_pdf(&inputs, "Test");
        let doc = doc.unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);

        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        let first = document::media_box(&doc, pages[&1], 1).unwrap();
        assert_eq!((first.width(), first.height()), (120.0, 90.0));
        let second = document::media_box(&doc, pages[&2], 2).unwrap();
        assert_eq!((second.width(), second.height()), (32.0, 48.0));
    }

    #[test]
    fn test_nothing_readable() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("x.jpg");
        std::fs::write(&broken, b"nope").unwrap();
        let inputs: Vec<InputFile> = InputFile::from_path(broken).into_iter().collect();
        let (doc, report) = images_to_pdf(&inputs, "Test");
        assert!(doc.is_none());
        assert_eq!(report.failed(), 1);
    }
}
