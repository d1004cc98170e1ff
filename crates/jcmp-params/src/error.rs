//! Error types for the params crate.

use std::path::PathBuf;

/// Errors that can occur while loading or resolving identification parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// The parameter document is not valid JSON for the DSL.
    #[error("identification parameters are not valid: {0}")]
    Parse(#[from] serde_json::Error),

    /// The parameter file exists but could not be read.
    #[error("cannot read identification parameters from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A node of the tree is structurally wrong.
    #[error("invalid identification parameter at '{path}': {reason}")]
    Invalid { path: String, reason: String },

    /// Nothing was provided at all.
    #[error("no identification parameters provided")]
    Empty,
}

/// Convenience alias for params results.
pub type ParamResult<T> = Result<T, ParamError>;
