/// Default workspace root, relative to the current directory
pub const DEFAULT_WORKSPACE: &str = "workspace";

/// Per-feature folder names
pub const INPUT_DIR: &str = "input";
pub const OUTPUT_DIR: &str = "output";
pub const TEMPLATE_DIR: &str = "template";

/// Default output file names for many-to-one features
pub const DEFAULT_MERGED_NAME: &str = "merged.pdf";
pub const DEFAULT_IMAGES_PDF_NAME: &str = "images.pdf";

/// Default text when no watermark template is present
pub const DEFAULT_WATERMARK_TEXT: &str = "WATERMARK";

/// Starting JPEG quality for the adaptive compressor
pub const INITIAL_QUALITY: u8 = 95;

/// Quality decrement per compressor iteration
pub const QUALITY_STEP: u8 = 5;

/// Quality at which the compressor accepts its best effort
pub const QUALITY_FLOOR: u8 = 20;

/// Quality at or below which downscaling kicks in (when permitted)
pub const RESIZE_THRESHOLD: u8 = 30;

/// Per-iteration downscale factor
pub const RESIZE_FACTOR: f32 = 0.9;

/// Smallest width/height the compressor will produce, in pixels
pub const MIN_DIMENSION: u32 = 50;

/// JPEG quality used when embedding images into generated PDFs
pub const EMBED_JPEG_QUALITY: u8 = 90;

/// Resolution for rasterizing PDF compression
pub const RASTER_COMPRESS_DPI: f32 = 150.0;

/// Resolution and JPEG quality for PDF to image conversion
pub const PAGE_IMAGE_DPI: f32 = 200.0;
pub const PAGE_IMAGE_QUALITY: u8 = 95;
