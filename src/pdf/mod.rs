//! Page-level PDF operations built on lopdf

pub mod builder;
pub mod document;
pub mod merge;
pub mod range;
pub mod render;
pub mod rotate;
pub mod split;
pub mod text_metrics;

pub use merge::{merge_documents, run_merge};
pub use range::{parse_page_ranges, PageRange, PageSelection};
pub use rotate::{rotate_document, run_rotate, RotationAngle};
pub use split::{extract_range, run_split};
