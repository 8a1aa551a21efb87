//! Embroidery thread catalog and nearest-color lookup.
//!
//! The catalog is a plain value: build one from the embedded DMC table, a JSON file, or a
//! list of colors, and hand a reference to whatever needs to match pixels against it.

use palette::{color_difference::Ciede2000, white_point::D65, FromColor, Lab, Srgb};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::MatchMetric;
use crate::error::PatternError;

/// Embedded DMC floss catalog, one entry per official color.
const DMC_CATALOG_JSON: &str = include_str!("../data/dmc_catalog.json");

/// One reference floss.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadColor {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub rgb: [u8; 3],
    pub symbol: String,
}

impl ThreadColor {
    pub fn new(code: &str, rgb: [u8; 3], symbol: &str) -> Self {
        Self {
            code: code.to_string(),
            name: String::new(),
            rgb,
            symbol: symbol.to_string(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn hex(&self) -> String {
        rgb_to_hex(self.rgb)
    }

    /// CSS `rgb(r, g, b)` notation.
    pub fn css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.rgb[0], self.rgb[1], self.rgb[2])
    }
}

/// Catalog row as stored on disk.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    code: String,
    #[serde(default)]
    name: String,
    red: u8,
    green: u8,
    blue: u8,
    symbol: String,
}

/// Immutable thread catalog with precomputed LAB values
pub struct ThreadPalette {
    threads: Vec<ThreadColor>,
    labs: Vec<Lab<D65, f32>>,
}

static DMC_PALETTE: OnceLock<Result<ThreadPalette, PatternError>> = OnceLock::new();

impl ThreadPalette {
    /// The embedded DMC catalog, parsed on first use and shared afterwards.
    pub fn dmc() -> Result<&'static Self, PatternError> {
        DMC_PALETTE
            .get_or_init(|| Self::from_json(DMC_CATALOG_JSON))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn new(threads: Vec<ThreadColor>) -> Result<Self, PatternError> {
        let mut codes = HashSet::new();
        for thread in &threads {
            if thread.code.trim().is_empty() {
                return Err(PatternError::Catalog("thread code cannot be empty".to_string()));
            }
            if thread.symbol.trim().is_empty() {
                return Err(PatternError::Catalog(format!(
                    "thread {} has no symbol",
                    thread.code
                )));
            }
            if !codes.insert(thread.code.as_str()) {
                return Err(PatternError::Catalog(format!(
                    "thread code {} appears more than once",
                    thread.code
                )));
            }
        }

        let labs = threads.iter().map(|t| rgb_to_lab(t.rgb)).collect();
        Ok(Self { threads, labs })
    }

    /// Parse a JSON array of `{code, name?, red, green, blue, symbol}` entries.
    pub fn from_json(raw: &str) -> Result<Self, PatternError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(raw)
            .map_err(|e| PatternError::Catalog(format!("Failed to parse catalog: {}", e)))?;

        let threads = entries
            .into_iter()
            .map(|entry| ThreadColor {
                code: entry.code,
                name: entry.name,
                rgb: [entry.red, entry.green, entry.blue],
                symbol: entry.symbol,
            })
            .collect();

        Self::new(threads)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, PatternError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| PatternError::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn threads(&self) -> &[ThreadColor] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn find(&self, code: &str) -> Option<&ThreadColor> {
        self.threads.iter().find(|t| t.code == code)
    }

    /// Closest thread by squared Euclidean RGB distance.
    ///
    /// Ties go to the entry that comes first in the catalog. `None` only for an empty
    /// catalog.
    pub fn nearest(&self, rgb: [u8; 3]) -> Option<&ThreadColor> {
        self.nearest_index(rgb).map(|idx| &self.threads[idx])
    }

    /// Like [`nearest`](Self::nearest), but accepts unchecked channel values: anything
    /// outside 0..=255 is treated as 0.
    pub fn nearest_lenient(&self, r: i64, g: i64, b: i64) -> Option<&ThreadColor> {
        self.nearest([sanitize_channel(r), sanitize_channel(g), sanitize_channel(b)])
    }

    /// Closest thread using CIEDE2000 Delta-E, same tie-break as `nearest`.
    pub fn nearest_perceptual(&self, rgb: [u8; 3]) -> Option<&ThreadColor> {
        self.nearest_perceptual_index(rgb)
            .map(|idx| &self.threads[idx])
    }

    pub fn nearest_by(&self, rgb: [u8; 3], metric: MatchMetric) -> Option<&ThreadColor> {
        self.nearest_index_by(rgb, metric)
            .map(|idx| &self.threads[idx])
    }

    pub(crate) fn nearest_index_by(&self, rgb: [u8; 3], metric: MatchMetric) -> Option<usize> {
        match metric {
            MatchMetric::Euclidean => self.nearest_index(rgb),
            MatchMetric::Ciede2000 => self.nearest_perceptual_index(rgb),
        }
    }

    pub(crate) fn thread(&self, idx: usize) -> &ThreadColor {
        &self.threads[idx]
    }

    fn nearest_index(&self, rgb: [u8; 3]) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, thread) in self.threads.iter().enumerate() {
            let dist = rgb_distance_sq(rgb, thread.rgb);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((i, dist)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn nearest_perceptual_index(&self, rgb: [u8; 3]) -> Option<usize> {
        let target = rgb_to_lab(rgb);
        self.labs
            .par_iter()
            .enumerate()
            .map(|(i, lab)| (i, target.difference(*lab)))
            .min_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            })
            .map(|(idx, _)| idx)
    }
}

fn sanitize_channel(value: i64) -> u8 {
    u8::try_from(value).unwrap_or(0)
}

pub(crate) fn rgb_distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

/// Convert RGB to hex string
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// Convert RGB [0-255] to LAB color space
pub(crate) fn rgb_to_lab(rgb: [u8; 3]) -> Lab<D65, f32> {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

pub(crate) fn lab_to_rgb(lab: Lab<D65, f32>) -> [u8; 3] {
    let srgb: Srgb<f32> = Srgb::from_color(lab);
    [
        (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}
