//! Error types for the fs crate.

use std::path::PathBuf;

use crate::folders::FolderComparison;

/// Errors that can occur while comparing files or listing folders.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// A document could not be read or decoded.
    #[error(transparent)]
    Codec(#[from] jcmp_codec::CodecError),

    /// The comparison itself failed.
    #[error(transparent)]
    Diff(#[from] jcmp_diff::DiffError),

    /// A directory could not be listed.
    #[error("cannot list {path:?}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One file pair of a folder run failed.
    #[error("comparing '{name}' failed: {source}")]
    File {
        name: String,
        #[source]
        source: Box<FsError>,
    },

    /// Visited and skipped files do not add up to the files listed.
    #[error("file count mismatch: {visited} visited + {skipped} skipped != {total} listed")]
    CountMismatch {
        visited: usize,
        skipped: usize,
        total: usize,
    },

    /// A worker thread panicked.
    #[error("a folder worker panicked")]
    WorkerPanicked,
}

/// Convenience alias for fs results.
pub type FsResult<T> = Result<T, FsError>;

/// A failed folder run: the first error, and everything merged before it.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct FolderError {
    #[source]
    pub error: FsError,
    pub partial: Box<FolderComparison>,
}

impl From<FsError> for FolderError {
    fn from(error: FsError) -> Self {
        Self {
            error,
            partial: Box::default(),
        }
    }
}
