use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown file kind: {0} (expected 'json' or 'xml')")]
    UnknownFileKind(String),
}
