//! The working raster and everything done to it on the way to a pattern.

use image::{imageops::FilterType, DynamicImage, ImageFormat, RgbImage};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::color_board::ColorBoard;
use crate::config::{
    in_range_or, MatchMetric, SymbolStyle, DEFAULT_COLORS, DEFAULT_WRAPPER_WIDTH, MAX_COLORS,
    MIN_COLORS,
};
use crate::error::{join_messages, PatternError};
use crate::quantize::reduce_palette;
use crate::render;
use crate::thread_palette::ThreadPalette;

/// Refuse to allocate rasters larger than this many pixels.
const MAX_RASTER_PIXELS: u64 = 1 << 26;

/// Raster encodings accepted as input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Jpeg,
    Png,
}

impl ImageKind {
    /// Pick the encoding from the extension of `name`, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, PatternError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "gif" => Ok(ImageKind::Gif),
            "jpg" | "jpeg" => Ok(ImageKind::Jpeg),
            "png" => Ok(ImageKind::Png),
            _ => Err(PatternError::UnsupportedFormat(extension)),
        }
    }

    pub fn format(self) -> ImageFormat {
        match self {
            ImageKind::Gif => ImageFormat::Gif,
            ImageKind::Jpeg => ImageFormat::Jpeg,
            ImageKind::Png => ImageFormat::Png,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
        }
    }
}

/// A raster on its way to becoming a cross-stitch pattern.
///
/// Failures are collected in order and can be inspected with [`has_errors`] and
/// [`errors`]; a decode failure leaves the instance without a raster, and every later
/// stage then returns [`PatternError::NoRaster`].
///
/// [`has_errors`]: PatternImage::has_errors
/// [`errors`]: PatternImage::errors
pub struct PatternImage<'p> {
    path: Option<PathBuf>,
    kind: Option<ImageKind>,
    raster: Option<RgbImage>,
    palette: &'p ThreadPalette,
    metric: MatchMetric,
    board: ColorBoard,
    analyzed: bool,
    errors: Vec<PatternError>,
}

impl<'p> PatternImage<'p> {
    /// Load an image file; the extension decides how it is decoded.
    pub fn open(path: &Path, palette: &'p ThreadPalette) -> Self {
        let name = path.to_string_lossy().to_string();
        let mut image = match std::fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes, &name, palette),
            Err(e) => {
                let mut image = Self::empty(palette);
                image.kind = ImageKind::from_name(&name).ok();
                image.errors.push(PatternError::Decode(e.to_string()));
                image
            }
        };
        image.path = Some(path.to_path_buf());
        image
    }

    /// Decode `bytes`, using the extension of `name_hint` to pick the format.
    pub fn from_bytes(bytes: &[u8], name_hint: &str, palette: &'p ThreadPalette) -> Self {
        let mut image = Self::empty(palette);

        let kind = match ImageKind::from_name(name_hint) {
            Ok(kind) => kind,
            Err(e) => {
                image.errors.push(e);
                return image;
            }
        };
        image.kind = Some(kind);

        match decode(bytes, kind) {
            Ok(raster) => {
                log::info!(
                    "Loaded {:?} image {}x{} from {} bytes",
                    kind,
                    raster.width(),
                    raster.height(),
                    bytes.len()
                );
                image.board = ColorBoard::new(raster.width(), raster.height());
                image.raster = Some(raster);
            }
            Err(e) => image.errors.push(e),
        }
        image
    }

    /// Start from an already decoded raster.
    pub fn from_raster(raster: RgbImage, kind: ImageKind, palette: &'p ThreadPalette) -> Self {
        let mut image = Self::empty(palette);
        image.kind = Some(kind);
        image.board = ColorBoard::new(raster.width(), raster.height());
        image.raster = Some(raster);
        image
    }

    fn empty(palette: &'p ThreadPalette) -> Self {
        Self {
            path: None,
            kind: None,
            raster: None,
            palette,
            metric: MatchMetric::default(),
            board: ColorBoard::default(),
            analyzed: false,
            errors: Vec::new(),
        }
    }

    pub fn with_metric(mut self, metric: MatchMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn width(&self) -> u32 {
        self.raster.as_ref().map(|r| r.width()).unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.raster.as_ref().map(|r| r.height()).unwrap_or(0)
    }

    pub fn kind(&self) -> Option<ImageKind> {
        self.kind
    }

    pub fn raster(&self) -> Option<&RgbImage> {
        self.raster.as_ref()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let raster = self.raster.as_ref()?;
        if x >= raster.width() || y >= raster.height() {
            return None;
        }
        Some(raster.get_pixel(x, y).0)
    }

    pub fn board(&self) -> &ColorBoard {
        &self.board
    }

    pub fn is_analyzed(&self) -> bool {
        self.analyzed
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[PatternError] {
        &self.errors
    }

    /// All recorded errors, joined for display.
    pub fn error_message(&self, separator: &str) -> String {
        join_messages(&self.errors, separator)
    }

    fn record<T>(&mut self, result: Result<T, PatternError>) -> Result<T, PatternError> {
        if let Err(e) = &result {
            self.errors.push(e.clone());
        }
        result
    }

    /// The raster, or a recorded `NoRaster` when loading failed.
    fn loaded(&mut self) -> Result<&RgbImage, PatternError> {
        if self.raster.is_none() {
            return self.record(Err(PatternError::NoRaster));
        }
        self.raster.as_ref().ok_or(PatternError::NoRaster)
    }

    /// Swap in a transformed raster. An existing analysis no longer describes it.
    fn replace_raster(&mut self, raster: RgbImage) {
        if self.analyzed {
            log::debug!("Raster replaced after analysis; clearing the color board");
        }
        self.board = ColorBoard::new(raster.width(), raster.height());
        self.analyzed = false;
        self.raster = Some(raster);
    }

    /// Quantize to at most `max_colors` colors, optionally dithering.
    ///
    /// A budget outside `MIN_COLORS..=MAX_COLORS` falls back to `DEFAULT_COLORS`.
    pub fn reduce(&mut self, max_colors: u32, dither: bool) -> Result<(), PatternError> {
        let start = Instant::now();
        let budget = in_range_or(max_colors, MIN_COLORS, MAX_COLORS, DEFAULT_COLORS);
        if budget != max_colors {
            log::debug!(
                "Color budget {} out of range, using {}",
                max_colors,
                budget
            );
        }
        let max_colors = budget;
        let raster = self.loaded()?;
        let result = reduce_palette(raster, max_colors, dither);
        let reduced = self.record(result)?;

        log::info!(
            "Reduced palette to at most {} colors (dither={}) in {}ms",
            max_colors,
            dither,
            start.elapsed().as_millis()
        );
        self.replace_raster(reduced);
        Ok(())
    }

    /// Resample to exactly `width` x `height`.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), PatternError> {
        let raster = self.loaded()?;
        let result = resample(raster, width, height);
        let resized = self.record(result)?;

        log::info!(
            "Resized {}x{} -> {}x{}",
            self.width(),
            self.height(),
            width,
            height
        );
        self.replace_raster(resized);
        Ok(())
    }

    /// Largest size within `max_width` x `max_height` that keeps the aspect ratio.
    pub fn resize_to_max(&mut self, max_width: u32, max_height: u32) -> Result<(), PatternError> {
        let raster = self.loaded()?;
        let (width, height) = fit_within(raster.width(), raster.height(), max_width, max_height);
        self.resize(width, height)
    }

    /// Scale both dimensions by `factor`, rounding to whole pixels.
    pub fn resize_scale(&mut self, factor: f64) -> Result<(), PatternError> {
        let (width, height) = self.loaded()?.dimensions();
        if !factor.is_finite() || factor <= 0.0 {
            return self.record(Err(PatternError::Resample(format!(
                "invalid scale factor {}",
                factor
            ))));
        }
        let width = (width as f64 * factor).round() as u32;
        let height = (height as f64 * factor).round() as u32;
        self.resize(width, height)
    }

    /// Resolve every pixel to its nearest thread color.
    ///
    /// Runs at most once: returns `Ok(false)` without doing anything when the board is
    /// already populated. Pixels without a match are recorded as errors and left unset.
    pub fn analyze(&mut self) -> Result<bool, PatternError> {
        if self.analyzed {
            return Ok(false);
        }
        let start = Instant::now();
        let palette = self.palette;
        let metric = self.metric;
        if self.raster.is_none() {
            return self.record(Err(PatternError::NoRaster));
        }
        let raster = self.raster.as_ref().ok_or(PatternError::NoRaster)?;
        let (width, height) = raster.dimensions();

        // A reduced raster holds few distinct colors, so match each of them only once.
        let distinct: Vec<[u8; 3]> = raster
            .pixels()
            .map(|p| p.0)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let resolved: HashMap<[u8; 3], Option<usize>> = distinct
            .par_iter()
            .map(|rgb| (*rgb, palette.nearest_index_by(*rgb, metric)))
            .collect();

        let mut board = ColorBoard::new(width, height);
        let mut misses = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = raster.get_pixel(x, y).0;
                match resolved.get(&[r, g, b]).copied().flatten() {
                    Some(idx) => {
                        board.set_color(x, y, palette.thread(idx));
                    }
                    None => misses.push(PatternError::ColorLookupMiss { x, y, r, g, b }),
                }
            }
        }

        log::info!(
            "Analyzed {}x{}: {} distinct pixel colors -> {} threads, {} misses, {}ms",
            width,
            height,
            distinct.len(),
            board.len(),
            misses.len(),
            start.elapsed().as_millis()
        );

        self.board = board;
        self.errors.extend(misses);
        self.analyzed = true;
        Ok(true)
    }

    fn ensure_analyzed(&mut self) -> Result<(), PatternError> {
        if !self.analyzed {
            self.analyze()?;
        }
        Ok(())
    }

    /// Colored-swatch preview table, analyzing first if needed.
    pub fn generate_preview(&mut self, wrapper_width: u32) -> Result<String, PatternError> {
        self.ensure_analyzed()?;
        Ok(render::preview_markup(&self.board, wrapper_width))
    }

    pub fn generate_default_preview(&mut self) -> Result<String, PatternError> {
        self.generate_preview(DEFAULT_WRAPPER_WIDTH)
    }

    /// Code/swatch table of the threads in use.
    pub fn generate_floss_table(&self) -> String {
        render::floss_table(&self.board.colors())
    }

    /// Write the printable, paginated pattern document to `output`.
    pub fn generate_pattern(
        &mut self,
        output: &Path,
        cover_image_name: &str,
        symbols: &SymbolStyle,
    ) -> Result<(), PatternError> {
        self.ensure_analyzed()?;
        let start = Instant::now();
        let html = render::pattern_document(&self.board, cover_image_name, symbols);

        let written = std::fs::write(output, html).map_err(|e| PatternError::Write {
            path: output.display().to_string(),
            reason: e.to_string(),
        });
        self.record(written)?;

        log::info!(
            "Wrote pattern {} ({} pages, {} threads) in {}ms",
            output.display(),
            render::paginate(self.width(), self.height()).len(),
            self.board.len(),
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Save the raster back to the path it was loaded from.
    pub fn save(&mut self) -> Result<(), PatternError> {
        match self.path.clone() {
            Some(path) => self.output(&path),
            None => self.record(Err(PatternError::Write {
                path: String::new(),
                reason: "image was not loaded from a file".to_string(),
            })),
        }
    }

    /// Encode the raster to `path` in the format it was loaded as.
    pub fn output(&mut self, path: &Path) -> Result<(), PatternError> {
        let kind = self.kind.unwrap_or(ImageKind::Png);
        let raster = self.loaded()?;
        let result = DynamicImage::ImageRgb8(raster.clone())
            .save_with_format(path, kind.format())
            .map_err(|e| PatternError::Write {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        self.record(result)
    }
}

fn decode(bytes: &[u8], kind: ImageKind) -> Result<RgbImage, PatternError> {
    let img = image::load_from_memory_with_format(bytes, kind.format())
        .map_err(|e| PatternError::Decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(PatternError::Decode(
            "Unable to read image metadata.".to_string(),
        ));
    }

    // Alpha blend with white background
    let rgba = img.to_rgba8();
    Ok(RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * a + 255.0 * (1.0 - a)).round() as u8;
        image::Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    }))
}

fn resample(raster: &RgbImage, width: u32, height: u32) -> Result<RgbImage, PatternError> {
    if width == 0 || height == 0 {
        return Err(PatternError::Resample(format!(
            "target size {}x{} is empty",
            width, height
        )));
    }
    if width as u64 * height as u64 > MAX_RASTER_PIXELS {
        return Err(PatternError::Resample(format!(
            "target size {}x{} is too large",
            width, height
        )));
    }
    if raster.width() == 0 || raster.height() == 0 {
        return Err(PatternError::Resample("source image is empty".to_string()));
    }
    Ok(image::imageops::resize(
        raster,
        width,
        height,
        FilterType::Triangle,
    ))
}

/// Scale `(width, height)` by `min(max_width / width, max_height / height)`, rounded.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let x_ratio = max_width as f64 / width as f64;
    let y_ratio = max_height as f64 / height as f64;
    let ratio = x_ratio.min(y_ratio);
    (
        (width as f64 * ratio).round() as u32,
        (height as f64 * ratio).round() as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread_palette::ThreadColor;
    use image::Rgb;
    use std::io::Cursor;

    fn catalog() -> ThreadPalette {
        ThreadPalette::new(vec![
            ThreadColor::new("310", [0, 0, 0], "X"),
            ThreadColor::new("B5200", [255, 255, 255], "O"),
            ThreadColor::new("321", [200, 20, 40], "R"),
            ThreadColor::new("798", [20, 60, 160], "B"),
        ])
        .unwrap()
    }

    fn checker(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([10, 10, 10])
            } else {
                Rgb([210, 30, 40])
            }
        })
    }

    fn png_bytes(raster: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(raster.clone())
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn extension_picks_the_format() {
        assert_eq!(ImageKind::from_name("photo.JPG").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_name("a.b.jpeg").unwrap(), ImageKind::Jpeg);
        assert_eq!(ImageKind::from_name("x.Png").unwrap(), ImageKind::Png);
        assert_eq!(ImageKind::from_name("anim.gif").unwrap(), ImageKind::Gif);
        assert_eq!(
            ImageKind::from_name("scan.bmp"),
            Err(PatternError::UnsupportedFormat("bmp".to_string()))
        );
        assert!(ImageKind::from_name("no_extension").is_err());
    }

    #[test]
    fn unsupported_extension_is_recorded_not_raised() {
        let palette = catalog();
        let mut image = PatternImage::from_bytes(b"whatever", "scan.tiff", &palette);
        assert!(image.has_errors());
        assert!(image.errors()[0].is_terminal());
        assert_eq!(image.analyze(), Err(PatternError::NoRaster));
        assert_eq!(image.resize(10, 10), Err(PatternError::NoRaster));
        assert_eq!(image.reduce(4, false), Err(PatternError::NoRaster));

        assert_eq!(
            image.errors(),
            &[
                PatternError::UnsupportedFormat("tiff".to_string()),
                PatternError::NoRaster,
                PatternError::NoRaster,
                PatternError::NoRaster,
            ]
        );
    }

    #[test]
    fn corrupt_bytes_are_a_decode_error() {
        let palette = catalog();
        let image = PatternImage::from_bytes(b"not a png", "broken.png", &palette);
        assert!(matches!(image.errors(), [PatternError::Decode(_)]));
        assert_eq!(image.width(), 0);
    }

    #[test]
    fn decodes_png_bytes() {
        let palette = catalog();
        let image = PatternImage::from_bytes(&png_bytes(&checker(6, 4)), "c.png", &palette);
        assert!(!image.has_errors());
        assert_eq!((image.width(), image.height()), (6, 4));
        assert_eq!(image.pixel(1, 0), Some([210, 30, 40]));
        assert_eq!(image.pixel(6, 0), None);
    }

    #[test]
    fn resize_to_max_keeps_the_aspect_ratio() {
        let palette = catalog();
        let mut image = PatternImage::from_raster(checker(200, 100), ImageKind::Png, &palette);
        image.resize_to_max(100, 50).unwrap();
        assert_eq!((image.width(), image.height()), (50, 25));

        assert_eq!(fit_within(300, 200, 100, 100), (100, 67));
        assert_eq!(fit_within(100, 300, 1000, 150), (50, 150));
    }

    #[test]
    fn resize_scale_rounds() {
        let palette = catalog();
        let mut image = PatternImage::from_raster(checker(33, 21), ImageKind::Png, &palette);
        image.resize_scale(0.5).unwrap();
        assert_eq!((image.width(), image.height()), (17, 11));
    }

    #[test]
    fn failed_resize_leaves_the_raster_alone() {
        let palette = catalog();
        let mut image = PatternImage::from_raster(checker(20, 10), ImageKind::Png, &palette);

        assert!(matches!(image.resize(0, 10), Err(PatternError::Resample(_))));
        assert!(matches!(
            image.resize_scale(f64::NAN),
            Err(PatternError::Resample(_))
        ));
        assert!(matches!(
            image.resize_to_max(0, 5),
            Err(PatternError::Resample(_))
        ));
        assert_eq!((image.width(), image.height()), (20, 10));
        assert_eq!(image.errors().len(), 3);
    }

    #[test]
    fn analyze_runs_once() {
        let palette = catalog();
        let mut image = PatternImage::from_raster(checker(5, 5), ImageKind::Png, &palette);

        assert_eq!(image.analyze(), Ok(true));
        let codes: Vec<String> = image.board().colors().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["310", "321"]);
        assert_eq!(image.board().stitch_count("310"), 13);

        assert_eq!(image.analyze(), Ok(false));
        assert_eq!(image.board().stitch_count("310"), 13);
        assert_eq!(image.board().len(), 2);
        assert!(!image.has_errors());
    }

    #[test]
    fn empty_catalog_records_one_miss_per_pixel() {
        let palette = ThreadPalette::new(Vec::new()).unwrap();
        let mut image = PatternImage::from_raster(checker(3, 2), ImageKind::Png, &palette);

        assert_eq!(image.analyze(), Ok(true));
        assert_eq!(image.errors().len(), 6);
        assert_eq!(
            image.errors()[1],
            PatternError::ColorLookupMiss {
                x: 1,
                y: 0,
                r: 210,
                g: 30,
                b: 40
            }
        );
        assert!(image.board().color_at(0, 0).is_none());
        // Rendering tolerates the gaps.
        assert!(image.generate_preview(880).unwrap().contains("Unresolved"));
    }

    #[test]
    fn reduce_then_analyze_stays_within_budget() {
        let palette = ThreadPalette::dmc().unwrap();
        let raster = RgbImage::from_fn(48, 32, |x, y| {
            Rgb([(x * 5) as u8, (y * 7) as u8, ((x * y) % 256) as u8])
        });
        let mut image = PatternImage::from_raster(raster, ImageKind::Png, palette);

        image.reduce(8, false).unwrap();
        image.analyze().unwrap();
        assert!(image.board().colors().len() <= 8);
    }

    #[test]
    fn out_of_range_color_budget_uses_the_default() {
        let palette = ThreadPalette::dmc().unwrap();
        let rich = RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
        });
        assert!(crate::quantize::count_colors(&rich) > 1000);

        for budget in [0, 1000, u32::MAX] {
            let mut image = PatternImage::from_raster(rich.clone(), ImageKind::Png, palette);
            image.reduce(budget, false).unwrap();
            let colors = crate::quantize::count_colors(image.raster().unwrap());
            assert!(colors > 1 && colors <= DEFAULT_COLORS as usize, "{} colors", colors);
        }
    }

    #[test]
    fn every_kind_round_trips_through_its_encoder() {
        let palette = catalog();
        let dir = tempfile::tempdir().unwrap();
        // Quadrants aligned to 16x16 macroblocks keep every JPEG block flat.
        let blocks = RgbImage::from_fn(32, 32, |x, y| match (x < 16, y < 16) {
            (true, true) => Rgb([0, 0, 0]),
            (false, true) => Rgb([255, 255, 255]),
            (true, false) => Rgb([200, 20, 40]),
            (false, false) => Rgb([20, 60, 160]),
        });

        for kind in [ImageKind::Gif, ImageKind::Jpeg, ImageKind::Png] {
            assert_eq!(ImageKind::from_name(&format!("a.{}", kind.extension())), Ok(kind));

            let path = dir.path().join(format!("blocks.{}", kind.extension()));
            let mut source = PatternImage::from_raster(blocks.clone(), kind, &palette);
            source.output(&path).unwrap();

            let bytes = std::fs::read(&path).unwrap();
            let magic: &[u8] = match kind {
                ImageKind::Gif => b"GIF8",
                ImageKind::Jpeg => &[0xFF, 0xD8, 0xFF],
                ImageKind::Png => b"\x89PNG",
            };
            assert!(bytes.starts_with(magic), "{:?} wrote the wrong container", kind);

            let reloaded = PatternImage::open(&path, &palette);
            assert!(!reloaded.has_errors(), "{:?}: {:?}", kind, reloaded.errors());
            assert_eq!(reloaded.kind(), Some(kind));
            assert_eq!((reloaded.width(), reloaded.height()), (32, 32));

            let tolerance = if kind == ImageKind::Jpeg { 16 } else { 0 };
            for (x, y) in [(8, 8), (24, 8), (8, 24), (24, 24)] {
                let expected = blocks.get_pixel(x, y).0;
                let actual = reloaded.pixel(x, y).unwrap();
                for c in 0..3 {
                    let diff = (expected[c] as i32 - actual[c] as i32).abs();
                    assert!(
                        diff <= tolerance,
                        "{:?} at ({}, {}): {:?} vs {:?}",
                        kind,
                        x,
                        y,
                        expected,
                        actual
                    );
                }
            }
        }
    }

    #[test]
    fn transforms_after_analysis_clear_the_board() {
        let palette = catalog();
        let mut image = PatternImage::from_raster(checker(10, 10), ImageKind::Png, &palette);
        image.analyze().unwrap();
        image.resize(5, 5).unwrap();

        assert!(!image.is_analyzed());
        assert!(image.board().is_empty());
        assert_eq!(image.board().width(), 5);
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let palette = catalog();
        let rgba = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 0]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();

        let image = PatternImage::from_bytes(&out.into_inner(), "clear.png", &palette);
        assert_eq!(image.pixel(0, 0), Some([255, 255, 255]));
    }
}
