//! Turn raster images into counted cross-stitch patterns matched to embroidery floss.

pub mod color_board;
pub mod config;
pub mod error;
pub mod pattern_image;
pub mod pipeline;
pub mod quantize;
pub mod render;
pub mod scratch;
pub mod thread_palette;

pub use color_board::ColorBoard;
pub use config::{MatchMetric, PatternSettings, SymbolStyle};
pub use error::PatternError;
pub use pattern_image::{ImageKind, PatternImage};
pub use pipeline::{generate_pattern, generate_preview, PatternArtifacts, PreviewResponse};
pub use thread_palette::{ThreadColor, ThreadPalette};
