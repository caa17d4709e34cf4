//! Error types for the lexhuff codec family.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the codec libraries.
#[derive(Error, Debug)]
pub enum CodecError {
    /// A code tree was requested over zero symbols
    #[error("Cannot build a code over an empty alphabet")]
    EmptyAlphabet,

    /// A symbol was assigned a code longer than the configured maximum
    #[error("Code length {length} for symbol {symbol} exceeds maximum of {max}")]
    CodeTooLong { symbol: u32, length: u32, max: u32 },

    /// Any other failure while building a code tree
    #[error("Code construction error: {0}")]
    Construction(String),

    /// A persisted model could not be parsed
    #[error("Malformed model: {0}")]
    MalformedModel(String),

    /// An encoded stream does not decode under the current model
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// The codec has not been trained or loaded
    #[error("Codec is not trained")]
    NotTrained,

    /// The model has no dictionary entry starting with this byte
    #[error("No dictionary entry covers byte 0x{0:02x}")]
    Unencodable(u8),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
