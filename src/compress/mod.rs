//! Image and PDF size reduction

pub mod image;
pub mod pdf;
pub mod raster;

pub use self::image::{compress_image_file, run_image_compression};
pub use self::pdf::{compress_pdf, run_pdf_compression, CompressionLevel};
pub use self::raster::{
    compress_to_target, CompressedImage, CompressionParams, CompressionTarget, JpegRasterEncoder,
    RasterEncoder,
};
