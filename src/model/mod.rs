pub mod format;
pub mod geometry;

pub use format::{FormatBucket, FormatLabel};
pub use geometry::PageGeometry;
