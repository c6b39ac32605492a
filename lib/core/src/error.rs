use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Insufficient data: {rows} usable rows, at least {required} required")]
    InsufficientData { rows: usize, required: usize },

    #[error("Shape mismatch: expected {expected} components, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Seed not found: {0}")]
    SeedNotFound(String),

    #[error("Feature mismatch: index built over {index:?}, row exposes {row:?}")]
    FeatureMismatch { index: Vec<String>, row: Vec<String> },

    #[error("Duplicate row id: {0}")]
    DuplicateRow(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Whether the error means the index must be rebuilt against the current table
    pub fn is_stale_index(&self) -> bool {
        matches!(self, Error::FeatureMismatch { .. })
    }
}
