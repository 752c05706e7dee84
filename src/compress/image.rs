//! Image compression batch: decode, normalize, shrink to a target size

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageDecoder, ImageReader, Rgb, RgbImage};

use crate::batch::input::COMPRESSIBLE_IMAGE_EXTENSIONS;
use crate::batch::{list_inputs, run_batch, BatchReport, InputFile};
use crate::config::{Feature, Settings};
use crate::error::ToolError;

use super::raster::{compress_to_target, CompressionParams, CompressionTarget, JpegRasterEncoder};

/// Decode an image file and rotate its pixels to match the EXIF orientation
pub fn load_upright(path: &Path) -> Result<DynamicImage, ToolError> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Composite any alpha channel onto a white background
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Output name for a compressed image: always a JPEG
pub fn output_name(input: &InputFile) -> String {
    match input.extension.as_str() {
        "jpg" | "jpeg" => input.name.clone(),
        _ => format!("{}.jpg", input.stem()),
    }
}

/// Compress a single image file into `output_dir`
pub fn compress_image_file(
    input: &InputFile,
    output_dir: &Path,
    target: &CompressionTarget,
    params: &CompressionParams,
) -> Result<String, ToolError> {
    let img = load_upright(&input.path)?;
    let rgb = flatten_onto_white(&img);
    drop(img);

    let result = compress_to_target(&rgb, target, params, &JpegRasterEncoder)?;

    let name = output_name(input);
    fs::write(output_dir.join(&name), &result.bytes)?;

    if !result.met_target(target) {
        log::warn!(
            "{}: best effort {} KB exceeds target {} KB",
            input.name,
            result.size_kb,
            target.max_size_kb
        );
    }

    Ok(format!(
        "{} -> {} KB (quality {}, {}x{})",
        name, result.size_kb, result.quality, result.width, result.height
    ))
}

/// Compress every image in the compress workspace
pub fn run_image_compression(
    settings: &Settings,
    target: &CompressionTarget,
) -> Result<BatchReport, ToolError> {
    settings.ensure_dirs(Feature::Compress)?;
    let output_dir = settings.output_dir(Feature::Compress);
    let inputs = list_inputs(
        &settings.input_dir(Feature::Compress),
        COMPRESSIBLE_IMAGE_EXTENSIONS,
    )?;
    let params = CompressionParams::default();

    // `photo.png` and `photo.jpg` would both become `photo.jpg`
    let mut written: HashMap<String, String> = HashMap::new();
    Ok(run_batch("Compress Image", &inputs, |input| {
        let name = output_name(input);
        let key = name.to_ascii_lowercase();
        if let Some(previous) = written.get(&key) {
            return Err(ToolError::OutputConflict {
                name,
                previous: previous.clone(),
            });
        }
        let detail = compress_image_file(input, &output_dir, target, &params)?;
        written.insert(key, input.name.clone());
        Ok(detail)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_flatten_transparent_becomes_white() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));

        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_flatten_half_alpha() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, Rgba([0, 0, 0, 128]));
        let flat = flatten_onto_white(&DynamicImage::ImageRgba8(rgba));
        let [r, _, _] = flat.get_pixel(0, 0).0;
        assert!((126..=128).contains(&r));
    }

    #[test]
    fn test_output_name() {
        let png = InputFile::from_path("/in/logo.png").unwrap();
        let jpeg = InputFile::from_path("/in/photo.JPEG").unwrap();
        assert_eq!(output_name(&png), "logo.jpg");
        assert_eq!(output_name(&jpeg), "photo.JPEG");
    }

    /// JPEG with an APP1 Exif segment carrying only an Orientation tag
    fn jpeg_with_orientation(img: &RgbImage, orientation: u8) -> Vec<u8> {
        let mut plain = std::io::Cursor::new(Vec::new());
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut plain, 95)
            .encode_image(img)
            .unwrap();
        let plain = plain.into_inner();

        #[rustfmt::skip]
        let tiff: [u8; 26] = [
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08,
            0x00, 0x01,
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, orientation, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);

        let mut out = plain[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&plain[2..]);
        out
    }

    #[test]
    fn test_load_upright_applies_exif_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sideways.jpg");
        // Red left half, blue right half
        let img = RgbImage::from_fn(40, 20, |x, _| {
            if x < 20 {
                Rgb([220, 20, 20])
            } else {
                Rgb([20, 20, 220])
            }
        });
        fs::write(&path, jpeg_with_orientation(&img, 6)).unwrap();

        let upright = load_upright(&path).unwrap().to_rgb8();
        assert_eq!(upright.dimensions(), (20, 40));
        // Rotated 90 degrees clockwise: the left half ends up on top
        let [r, _, b] = upright.get_pixel(10, 5).0;
        assert!(r > 150 && b < 100);
        let [r, _, b] = upright.get_pixel(10, 35).0;
        assert!(b > 150 && r < 100);
    }

    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
            }
        }
        !crc
    }

    fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let mut body = kind.to_vec();
        body.extend_from_slice(data);
        out.extend_from_slice(&body);
        out.extend_from_slice(&crc32(&body).to_be_bytes());
    }

    /// Zlib stream made of stored (uncompressed) deflate blocks
    fn zlib_stored(data: &[u8]) -> Vec<u8> {
        let mut out = vec![0x78, 0x01];
        let blocks: Vec<&[u8]> = data.chunks(0xFFFF).collect();
        for (index, block) in blocks.iter().enumerate() {
            out.push(u8::from(index + 1 == blocks.len()));
            let len = block.len() as u16;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(&(!len).to_le_bytes());
            out.extend_from_slice(block);
        }
        let (mut a, mut b) = (1u32, 0u32);
        for &byte in data {
            a = (a + byte as u32) % 65521;
            b = (b + a) % 65521;
        }
        out.extend_from_slice(&((b << 16) | a).to_be_bytes());
        out
    }

    /// 8-bit palette PNG: index 0 fully transparent red, index 1 opaque blue
    fn indexed_png(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 3, 0, 0, 0]);

        let mut raw = Vec::new();
        for _ in 0..height {
            raw.push(0);
            raw.extend((0..width).map(|x| u8::from(x >= width / 2)));
        }

        let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
        png_chunk(&mut out, b"IHDR", &ihdr);
        png_chunk(&mut out, b"PLTE", &[255, 0, 0, 0, 0, 255]);
        png_chunk(&mut out, b"tRNS", &[0, 255]);
        png_chunk(&mut out, b"IDAT", &zlib_stored(&raw));
        png_chunk(&mut out, b"IEND", &[]);
        out
    }

    #[test]
    fn test_compress_indexed_png() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("palette.png");
        fs::write(&src, indexed_png(64, 48)).unwrap();

        let input = InputFile::from_path(&src).unwrap();
        let target = CompressionTarget::new(100, true).unwrap();
        compress_image_file(&input, dir.path(), &target, &CompressionParams::default())
            .unwrap();

        let decoded = image::open(dir.path().join("palette.jpg")).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (64, 48));
        // Transparent palette entry is flattened onto white
        assert!(decoded.get_pixel(8, 24).0.iter().all(|&c| c > 230));
        let [r, _, b] = decoded.get_pixel(56, 24).0;
        assert!(b > 200 && r < 60);
    }

    #[test]
    fn test_compress_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("gradient.png");
        let img = RgbaImage::from_fn(200, 150, |x, y| Rgba([x as u8, y as u8, 128, 200]));
        img.save(&src).unwrap();

        let input = InputFile::from_path(&src).unwrap();
        let target = CompressionTarget::new(500, true).unwrap();
        let detail =
            compress_image_file(&input, dir.path(), &target, &CompressionParams::default())
                .unwrap();

        let out = dir.path().join("gradient.jpg");
        assert!(out.exists());
        assert!(detail.starts_with("gradient.jpg -> "));
        let decoded = image::open(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 150));
    }
}
