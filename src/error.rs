use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[cfg(feature = "render")]
    #[error("Render error: {0}")]
    Render(#[from] mupdf::Error),

    #[error("Page rendering is not available in this build (enable the `render` feature)")]
    RenderUnavailable,

    #[error("Page {0} has no usable MediaBox")]
    MissingPageBox(u32),

    #[error("Malformed PDF structure: {0}")]
    Structure(String),

    #[error("Missing {part} in {file}")]
    MissingPart { file: String, part: String },

    #[error("{name} was already written from {previous}")]
    OutputConflict { name: String, previous: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Invalid user-supplied parameters, rejected before any file is processed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid target size: {0} (expected a positive whole number of KB)")]
    InvalidTargetSize(String),

    #[error("Invalid compression level: {0} (expected 1-9)")]
    InvalidCompressionLevel(String),

    #[error("Invalid rotation angle: {0} (expected 90, 180 or 270)")]
    InvalidRotation(String),

    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),
}
