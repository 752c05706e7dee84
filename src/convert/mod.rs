//! Format conversion

pub mod images_to_pdf;
pub mod office;
pub mod pdf_to_images;
pub mod text_pages;

pub use images_to_pdf::{images_to_pdf, run_images_to_pdf, trim_white_margins};
pub use office::{run_excel_to_pdf, run_word_to_pdf};
pub use pdf_to_images::run_pdf_to_images;
