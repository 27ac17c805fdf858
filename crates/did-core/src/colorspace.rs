//! Color space tags.
//!
//! Images carry a [`ColorSpace`] per row. The conversion formulas live
//! outside this workspace; here the tag only records which encoding the
//! samples of a row are in. Gradient fields must be built from rows that
//! share one encoding; callers are responsible for that.

/// Encoding of the three channels of an image row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Luma plus two chroma channels, chroma re-centered on 0.5.
    Yuv,
    /// Hue, saturation, value.
    Hsv,
}

impl ColorSpace {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "rgb",
            Self::Yuv => "yuv",
            Self::Hsv => "hsv",
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
