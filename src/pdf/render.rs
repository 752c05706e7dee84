//! Rasterizing PDF pages through MuPDF
//!
//! MuPDF is a native library, so rendering sits behind the `render` cargo
//! feature. Without it every call reports `ToolError::RenderUnavailable`.

use std::path::Path;

use image::RgbImage;

use crate::error::ToolError;

/// PDF user space is 72 units per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Page size in points of an image rendered at `dpi`
pub fn page_size_pt(img: &RgbImage, dpi: f32) -> (f64, f64) {
    let (points, dpi) = (POINTS_PER_INCH as f64, dpi as f64);
    let (width, height) = img.dimensions();
    (width as f64 * points / dpi, height as f64 * points / dpi)
}

/// Render every page of the PDF at `path` in order, handing each bitmap to
/// `on_page` with its 1-based page number. Returns the page count.
#[cfg(feature = "render")]
pub fn render_pages<F>(path: &Path, dpi: f32, mut on_page: F) -> Result<u32, ToolError>
where
    F: FnMut(u32, RgbImage) -> Result<(), ToolError>,
{
    use mupdf::{Colorspace, Matrix};

    let path = path.to_str().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("path is not valid UTF-8: {}", path.display()),
        )
    })?;
    let doc = mupdf::Document::open(path)?;
    let count = doc.page_count()?;

    let scale = dpi / POINTS_PER_INCH;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();

    for index in 0..count {
        let page = doc.load_page(index)?;
        let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;
        let img = pixmap_to_rgb(&pixmap)?;
        log::debug!("rendered page {} at {}x{}", index + 1, img.width(), img.height());
        on_page(index as u32 + 1, img)?;
    }

    Ok(count.max(0) as u32)
}

#[cfg(not(feature = "render"))]
pub fn render_pages<F>(_path: &Path, _dpi: f32, _on_page: F) -> Result<u32, ToolError>
where
    F: FnMut(u32, RgbImage) -> Result<(), ToolError>,
{
    Err(ToolError::RenderUnavailable)
}

#[cfg(feature = "render")]
fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> Result<RgbImage, ToolError> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(ToolError::Structure(format!(
            "pixmap has {} components, expected RGB",
            n
        )));
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in pixmap
        .samples()
        .chunks_exact(n)
        .take(width as usize * height as usize)
    {
        rgb.extend_from_slice(&pixel[..3]);
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ToolError::Structure("pixmap is smaller than its dimensions".to_string()))
}
