//! Error types for the codec crate.

use std::path::PathBuf;

/// Errors that can occur while reading or decoding a document.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The file could not be read.
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The text is not valid (or not supported) XML.
    #[error("invalid XML: {0}")]
    Xml(String),

    /// Decoding a file failed.
    #[error("cannot decode {path:?}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: Box<CodecError>,
    },
}

/// Convenience alias for codec results.
pub type CodecResult<T> = Result<T, CodecError>;
