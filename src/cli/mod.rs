pub mod args;
pub mod menu;

pub use args::{Args, Command, CompressCommand, ConvertCommand};
pub use menu::run_menu;
