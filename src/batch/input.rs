use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ToolError;

pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const COMPRESSIBLE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const CONVERTIBLE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// One file queued for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub name: String,
    /// Lowercased extension without the dot
    pub extension: String,
}

impl InputFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        Some(Self {
            path,
            name,
            extension,
        })
    }

    /// File name without its extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn has_extension(&self, extensions: &[&str]) -> bool {
        extensions.contains(&self.extension.as_str())
    }
}

/// List regular files in `dir` whose extension matches, sorted by file name.
///
/// A missing directory is created and yields an empty list.
pub fn list_inputs(dir: &Path, extensions: &[&str]) -> Result<Vec<InputFile>, ToolError> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut inputs: Vec<InputFile> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| InputFile::from_path(entry.path()))
        .filter(|input| input.has_extension(extensions))
        .collect();

    inputs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(inputs)
}
