use thiserror::Error;

/// Everything that can go wrong between loading a raster and writing a pattern.
///
/// `PatternImage` keeps these in an ordered list so a caller can check after each stage
/// and show the whole story to the user, but each operation also hands its own failure
/// back as a `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Unrecognized file extension: {0}")]
    UnsupportedFormat(String),

    #[error("Unable to load image: {0}")]
    Decode(String),

    #[error("No image is loaded")]
    NoRaster,

    #[error("Unable to transform image: {0}")]
    Resample(String),

    #[error("Could not find color closest to rgb({r}, {g}, {b}) at ({x}, {y})")]
    ColorLookupMiss { x: u32, y: u32, r: u8, g: u8, b: u8 },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Invalid thread catalog: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Every error a failed run recorded, in the order they happened.
    #[error("{}", join_messages(.0, "; "))]
    Multiple(Vec<PatternError>),
}

impl PatternError {
    /// Errors after which the instance cannot produce anything useful.
    pub fn is_terminal(&self) -> bool {
        match self {
            PatternError::UnsupportedFormat(_) | PatternError::Decode(_) | PatternError::NoRaster => {
                true
            }
            PatternError::Multiple(errors) => errors.iter().any(PatternError::is_terminal),
            _ => false,
        }
    }

    /// Collapse a recorded error list: one error stays as is, several become `Multiple`.
    pub fn from_list(mut errors: Vec<PatternError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(PatternError::Multiple(errors)),
        }
    }

    /// The individual errors, flattening `Multiple`.
    pub fn errors(&self) -> Vec<&PatternError> {
        match self {
            PatternError::Multiple(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            other => vec![other],
        }
    }
}

/// Join error messages for display with `separator` between them.
pub fn join_messages(errors: &[PatternError], separator: &str) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl From<std::io::Error> for PatternError {
    fn from(e: std::io::Error) -> Self {
        PatternError::Io(e.to_string())
    }
}
