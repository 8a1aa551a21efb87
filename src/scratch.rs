//! Request-scoped files that must not outlive the request.

use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::PatternError;

/// How many names to try before giving up on finding an unused one.
pub const MAX_NAME_ATTEMPTS: u32 = 100;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A file that is deleted when the guard is dropped, on every exit path.
///
/// [`keep`](ScratchFile::keep) releases the file so it survives the guard.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    /// Write `contents` to a fresh, uniquely named file in `dir`.
    pub fn create(dir: &Path, extension: &str, contents: &[u8]) -> Result<Self, PatternError> {
        fs::create_dir_all(dir)?;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(file_name(&random_seed(attempt), extension));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            // Own the path before writing so a failed write still cleans up.
            let scratch = Self::adopt(path);
            file.write_all(contents)?;
            log::debug!("Staged {} bytes in {}", contents.len(), scratch.path.display());
            return Ok(scratch);
        }

        Err(PatternError::Io(format!(
            "no unused scratch file name in {} after {} attempts",
            dir.display(),
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Guard `path`, whether or not anything has been written there yet.
    pub fn adopt(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the file in place and hand back its path.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// First `stem.extension` in `dir` for which none of `extensions` exist yet.
///
/// The stem is derived from `seed`, so the same input lands on the same name unless
/// that name is taken.
pub fn unused_stem(dir: &Path, seed: &[u8], extensions: &[&str]) -> Result<String, PatternError> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        if attempt > 0 {
            hasher.update(attempt.to_le_bytes());
        }
        let stem = short_hex(&hasher.finalize());

        let taken = extensions
            .iter()
            .any(|ext| dir.join(format!("{}.{}", stem, ext)).exists());
        if !taken {
            return Ok(stem);
        }
    }

    Err(PatternError::Io(format!(
        "no unused output name in {} after {} attempts",
        dir.display(),
        MAX_NAME_ATTEMPTS
    )))
}

fn random_seed(attempt: u32) -> Vec<u8> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let count = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut seed = Vec::with_capacity(32);
    seed.extend_from_slice(&nanos.to_le_bytes());
    seed.extend_from_slice(&count.to_le_bytes());
    seed.extend_from_slice(&std::process::id().to_le_bytes());
    seed.extend_from_slice(&attempt.to_le_bytes());
    seed
}

fn file_name(seed: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(seed);
    format!("{}.{}", short_hex(&digest), extension)
}

fn short_hex(digest: &[u8]) -> String {
    digest.iter().take(16).map(|b| format!("{:02x}", b)).collect()
}
