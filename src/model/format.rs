use std::fmt;

/// Paper format independent of orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatBucket {
    A4,
    F4,
}

/// Paper format plus orientation, used to pick a watermark template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatLabel {
    #[default]
    A4Portrait,
    A4Landscape,
    F4Portrait,
    F4Landscape,
}

impl FormatLabel {
    pub fn new(bucket: FormatBucket, portrait: bool) -> Self {
        match (bucket, portrait) {
            (FormatBucket::A4, true) => FormatLabel::A4Portrait,
            (FormatBucket::A4, false) => FormatLabel::A4Landscape,
            (FormatBucket::F4, true) => FormatLabel::F4Portrait,
            (FormatBucket::F4, false) => FormatLabel::F4Landscape,
        }
    }

    pub fn bucket(&self) -> FormatBucket {
        match self {
            FormatLabel::A4Portrait | FormatLabel::A4Landscape => FormatBucket::A4,
            FormatLabel::F4Portrait | FormatLabel::F4Landscape => FormatBucket::F4,
        }
    }

    pub fn is_portrait(&self) -> bool {
        matches!(self, FormatLabel::A4Portrait | FormatLabel::F4Portrait)
    }

    /// File name of the watermark template for this format
    pub fn template_file(&self) -> &'static str {
        match self {
            FormatLabel::A4Portrait => "wm_a4_portrait.png",
            FormatLabel::A4Landscape => "wm_a4_landscape.png",
            FormatLabel::F4Portrait => "wm_f4_portrait.png",
            FormatLabel::F4Landscape => "wm_f4_landscape.png",
        }
    }

    pub fn all() -> [FormatLabel; 4] {
        [
            FormatLabel::A4Portrait,
            FormatLabel::A4Landscape,
            FormatLabel::F4Portrait,
            FormatLabel::F4Landscape,
        ]
    }
}

impl fmt::Display for FormatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FormatLabel::A4Portrait => "A4-Portrait",
            FormatLabel::A4Landscape => "A4-Landscape",
            FormatLabel::F4Portrait => "F4-Portrait",
            FormatLabel::F4Landscape => "F4-Landscape",
        };
        write!(f, "{}", s)
    }
}
