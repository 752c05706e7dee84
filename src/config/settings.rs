use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::defaults::*;

/// A feature area of the workspace, each with its own input/output folders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Watermark,
    Merge,
    Split,
    Compress,
    Rotate,
    Convert,
}

impl Feature {
    pub fn folder_name(&self) -> &'static str {
        match self {
            Feature::Watermark => "watermark",
            Feature::Merge => "merge",
            Feature::Split => "split",
            Feature::Compress => "compress",
            Feature::Rotate => "rotate",
            Feature::Convert => "convert",
        }
    }

    pub fn all() -> [Feature; 6] {
        [
            Feature::Watermark,
            Feature::Merge,
            Feature::Split,
            Feature::Compress,
            Feature::Rotate,
            Feature::Convert,
        ]
    }
}

/// Runtime settings: where the workspace lives
#[derive(Debug, Clone)]
pub struct Settings {
    pub workspace: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from(DEFAULT_WORKSPACE),
        }
    }
}

impl Settings {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
        }
    }

    pub fn feature_dir(&self, feature: Feature) -> PathBuf {
        self.workspace.join(feature.folder_name())
    }

    pub fn input_dir(&self, feature: Feature) -> PathBuf {
        self.feature_dir(feature).join(INPUT_DIR)
    }

    pub fn output_dir(&self, feature: Feature) -> PathBuf {
        self.feature_dir(feature).join(OUTPUT_DIR)
    }

    /// Folder holding the per-format watermark images
    pub fn template_dir(&self) -> PathBuf {
        self.feature_dir(Feature::Watermark).join(TEMPLATE_DIR)
    }

    /// Create the input and output folders for a feature if missing
    pub fn ensure_dirs(&self, feature: Feature) -> io::Result<()> {
        fs::create_dir_all(self.input_dir(feature))?;
        fs::create_dir_all(self.output_dir(feature))?;
        if feature == Feature::Watermark {
            fs::create_dir_all(self.template_dir())?;
        }
        Ok(())
    }

    /// Create the whole folder tree
    pub fn ensure_workspace(&self) -> io::Result<()> {
        for feature in Feature::all() {
            self.ensure_dirs(feature)?;
        }
        Ok(())
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_paths() {
        let settings = Settings::new("/tmp/ws");
        assert_eq!(
            settings.input_dir(Feature::Compress),
            PathBuf::from("/tmp/ws/compress/input")
        );
        assert_eq!(
            settings.output_dir(Feature::Rotate),
            PathBuf::from("/tmp/ws/rotate/output")
        );
        assert_eq!(
            settings.template_dir(),
            PathBuf::from("/tmp/ws/watermark/template")
        );
    }

    #[test]
    fn test_default_workspace() {
        assert_eq!(Settings::default().workspace(), Path::new("workspace"));
    }
}
