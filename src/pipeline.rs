//! End-to-end runs: source image in, preview markup or pattern files out.
//!
//! Each run stages the source in a scratch file that is removed however the run ends.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PatternSettings;
use crate::error::{join_messages, PatternError};
use crate::pattern_image::{ImageKind, PatternImage};
use crate::scratch::{unused_stem, ScratchFile};
use crate::thread_palette::ThreadPalette;

const PIPELINE_VERSION: u8 = 1;

pub const GENERIC_FAILURE: &str =
    "There was an error processing your request right now. Please try again later.";
pub const PREVIEW_READY: &str =
    "Feel free to tweak the limits if the preview doesn't look quite right yet.";
/// Joins error messages shown to the user.
pub const ERROR_SEPARATOR: &str = "<br />";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub width: u32,
    pub height: u32,
    pub thread_count: usize,
}

impl PreviewResponse {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            preview: None,
            table: None,
            width: 0,
            height: 0,
            thread_count: 0,
        }
    }
}

/// Files produced by [`generate_pattern`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternArtifacts {
    pub document: PathBuf,
    pub cover: PathBuf,
    pub width: u32,
    pub height: u32,
    pub thread_count: usize,
    pub processing_time_ms: u64,
}

struct Prepared<'p> {
    image: PatternImage<'p>,
    source_bytes: Vec<u8>,
    _scratch: ScratchFile,
}

/// Load, resize, reduce and analyze `source` under `settings`.
///
/// Stops after the first stage that leaves errors behind and hands all of them back.
fn prepare<'p>(
    source: &Path,
    settings: &PatternSettings,
    palette: &'p ThreadPalette,
    scratch_dir: &Path,
) -> Result<Prepared<'p>, Vec<PatternError>> {
    let source_bytes = std::fs::read(source).map_err(|e| {
        vec![PatternError::Decode(format!(
            "{}: {}",
            source.display(),
            e
        ))]
    })?;

    let name = source.to_string_lossy();
    let extension = match ImageKind::from_name(&name) {
        Ok(kind) => kind.extension().to_string(),
        Err(e) => return Err(vec![e]),
    };
    let scratch =
        ScratchFile::create(scratch_dir, &extension, &source_bytes).map_err(|e| vec![e])?;

    let mut image = PatternImage::open(scratch.path(), palette).with_metric(settings.metric);
    if image.has_errors() {
        return Err(image.errors().to_vec());
    }

    let transformed = image
        .resize_to_max(settings.width, settings.height)
        .and_then(|()| image.reduce(settings.colors, settings.dither));
    if transformed.is_err() || image.has_errors() {
        return Err(image.errors().to_vec());
    }

    image.analyze().map_err(|e| vec![e])?;
    if image.has_errors() {
        return Err(image.errors().to_vec());
    }

    Ok(Prepared {
        image,
        source_bytes,
        _scratch: scratch,
    })
}

fn join_errors(errors: &[PatternError]) -> String {
    if errors.is_empty() {
        return GENERIC_FAILURE.to_string();
    }
    join_messages(errors, ERROR_SEPARATOR)
}

/// Build the on-screen preview and floss table for `source`.
///
/// Never fails outright: problems come back as `success: false` with a message.
pub fn generate_preview(
    source: &Path,
    settings: &PatternSettings,
    palette: &ThreadPalette,
    scratch_dir: &Path,
) -> PreviewResponse {
    let start = Instant::now();
    let settings = settings.sanitized();
    log::info!(
        "Generating preview for {}: max {}x{}, {} colors, dither={}",
        source.display(),
        settings.width,
        settings.height,
        settings.colors,
        settings.dither
    );

    let mut prepared = match prepare(source, &settings, palette, scratch_dir) {
        Ok(prepared) => prepared,
        Err(errors) => {
            log::warn!("Preview failed with {} error(s)", errors.len());
            return PreviewResponse::failure(join_errors(&errors));
        }
    };

    let image = &mut prepared.image;
    let preview = match image.generate_preview(settings.wrapper_width) {
        Ok(preview) => preview,
        Err(e) => return PreviewResponse::failure(e.to_string()),
    };
    let table = image.generate_floss_table();

    log::info!(
        "Preview ready: {}x{}, {} threads, {}ms",
        image.width(),
        image.height(),
        image.board().len(),
        start.elapsed().as_millis()
    );

    PreviewResponse {
        success: true,
        message: PREVIEW_READY.to_string(),
        preview: Some(preview),
        table: Some(table),
        width: image.width(),
        height: image.height(),
        thread_count: image.board().len(),
    }
}

/// Render the printable pattern for `source` into `output_dir`.
///
/// Writes `<stem>.html` and the cover thumbnail `<stem>.<ext>`, where the stem is derived
/// from the source bytes and the settings. Either both files are left behind or neither.
///
/// When preparation fails, every recorded error comes back in order, as
/// [`PatternError::Multiple`] if there is more than one.
pub fn generate_pattern(
    source: &Path,
    settings: &PatternSettings,
    palette: &ThreadPalette,
    scratch_dir: &Path,
    output_dir: &Path,
) -> Result<PatternArtifacts, PatternError> {
    let start = Instant::now();
    let settings = settings.sanitized();

    let mut prepared = prepare(source, &settings, palette, scratch_dir).map_err(|errors| {
        log::warn!("Pattern preparation failed with {} error(s)", errors.len());
        PatternError::from_list(errors)
            .unwrap_or_else(|| PatternError::Io(GENERIC_FAILURE.to_string()))
    })?;

    std::fs::create_dir_all(output_dir)?;
    let extension = prepared
        .image
        .kind()
        .unwrap_or(ImageKind::Png)
        .extension();
    let seed = artifact_seed(&prepared.source_bytes, &settings);
    let stem = unused_stem(output_dir, &seed, &["html", extension])?;

    let cover_name = format!("{}.{}", stem, extension);
    let cover = ScratchFile::adopt(output_dir.join(&cover_name));
    let document = ScratchFile::adopt(output_dir.join(format!("{}.html", stem)));

    let image = &mut prepared.image;
    image.output(cover.path())?;
    image.generate_pattern(document.path(), &cover_name, &settings.symbol_style)?;

    Ok(PatternArtifacts {
        document: document.keep(),
        cover: cover.keep(),
        width: image.width(),
        height: image.height(),
        thread_count: image.board().len(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    })
}

fn artifact_seed(source_bytes: &[u8], settings: &PatternSettings) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update([PIPELINE_VERSION]);
    hasher.update(source_bytes);
    hasher.update(settings.width.to_le_bytes());
    hasher.update(settings.height.to_le_bytes());
    hasher.update(settings.colors.to_le_bytes());
    hasher.update([settings.dither as u8]);
    hasher.update(serde_json::to_vec(&settings.metric).unwrap_or_default());
    hasher.update(serde_json::to_vec(&settings.symbol_style).unwrap_or_default());
    hasher.finalize().to_vec()
}
