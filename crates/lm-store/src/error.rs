use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
    TomlParse(toml::de::Error),
    TomlWrite(toml::ser::Error),
    InvalidData(String),
    Source(SourceError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            StoreError::Json(e) => write!(f, "JSON error: {e}"),
            StoreError::TomlParse(e) => write!(f, "invalid config: {e}"),
            StoreError::TomlWrite(e) => write!(f, "failed to encode config: {e}"),
            StoreError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
            StoreError::Source(e) => write!(f, "note application {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(e: toml::de::Error) -> Self {
        StoreError::TomlParse(e)
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(e: toml::ser::Error) -> Self {
        StoreError::TomlWrite(e)
    }
}

impl From<SourceError> for StoreError {
    fn from(e: SourceError) -> Self {
        StoreError::Source(e)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Why a content source produced nothing. Always recoverable: the next
/// source in the chain is tried.
#[derive(Debug)]
pub enum SourceError {
    /// The source could not be reached (spawn failure, non-zero exit, ...).
    Unavailable(String),
    /// The source did not answer within its time limit.
    Timeout(Duration),
    /// The source answered but had nothing for the requested day.
    Empty,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            SourceError::Timeout(d) => write!(f, "timed out after {}ms", d.as_millis()),
            SourceError::Empty => write!(f, "no content"),
        }
    }
}

impl std::error::Error for SourceError {}
