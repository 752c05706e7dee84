pub mod batch;
pub mod cli;
pub mod compress;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod pdf;
pub mod task;
pub mod watermark;

pub use batch::BatchReport;
pub use compress::{compress_to_target, CompressedImage, CompressionTarget};
pub use config::{Feature, Settings};
pub use error::{ConfigError, ToolError};
pub use model::{FormatLabel, PageGeometry};
pub use task::Task;
pub use watermark::{classify, detect};
