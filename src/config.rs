use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::PatternError;

pub const MIN_COLORS: u32 = 1;
pub const DEFAULT_COLORS: u32 = 50;
pub const MAX_COLORS: u32 = 100;
pub const MIN_WIDTH: u32 = 10;
pub const DEFAULT_WIDTH: u32 = 200;
pub const MAX_WIDTH: u32 = 1000;
pub const MIN_HEIGHT: u32 = 10;
pub const DEFAULT_HEIGHT: u32 = 200;
pub const MAX_HEIGHT: u32 = 1000;

/// Preview swatches are sized against this container width unless told otherwise.
pub const DEFAULT_WRAPPER_WIDTH: u32 = 880;

/// How a pixel is matched against the thread catalog.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMetric {
    /// Squared Euclidean distance in sRGB.
    #[default]
    Euclidean,
    /// CIEDE2000 Delta-E in CIE Lab (D65).
    Ciede2000,
}

/// How a thread symbol is drawn inside a printed pattern cell.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SymbolStyle {
    /// The symbol text itself.
    #[default]
    Glyph,
    /// `<img src="{dir}/{symbol}.png">`
    Image { dir: String },
}

/// Pattern request settings.
///
/// Out-of-range values are not rejected: `sanitized` swaps each one for its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    pub width: u32,
    pub height: u32,
    pub colors: u32,
    pub dither: bool,
    pub metric: MatchMetric,
    pub symbol_style: SymbolStyle,
    pub wrapper_width: u32,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            colors: DEFAULT_COLORS,
            dither: false,
            metric: MatchMetric::Euclidean,
            symbol_style: SymbolStyle::Glyph,
            wrapper_width: DEFAULT_WRAPPER_WIDTH,
        }
    }
}

impl PatternSettings {
    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, PatternError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PatternError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| PatternError::Io(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn sanitized(&self) -> Self {
        Self {
            width: in_range_or(self.width, MIN_WIDTH, MAX_WIDTH, DEFAULT_WIDTH),
            height: in_range_or(self.height, MIN_HEIGHT, MAX_HEIGHT, DEFAULT_HEIGHT),
            colors: in_range_or(self.colors, MIN_COLORS, MAX_COLORS, DEFAULT_COLORS),
            wrapper_width: if self.wrapper_width == 0 {
                DEFAULT_WRAPPER_WIDTH
            } else {
                self.wrapper_width
            },
            ..self.clone()
        }
    }
}

pub(crate) fn in_range_or(value: u32, min: u32, max: u32, default: u32) -> u32 {
    if (min..=max).contains(&value) {
        value
    } else {
        default
    }
}
