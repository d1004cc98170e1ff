//! File and folder comparison for jcmp.
//!
//! [`compare_files`] decodes two documents and compares them.
//! [`compare_folders`] pairs the files of two directories by name and
//! compares every pair on a fixed pool of scoped worker threads, merging
//! per-file results into one delta keyed by file name.
//!
//! # Key Types
//!
//! - [`FolderComparison`] -- Merged delta plus bookkeeping of a folder run
//! - [`FolderError`] -- First failure of a folder run, with the partial result
//! - [`FsError`] -- File-level and listing failures

pub mod error;
pub mod files;
pub mod folders;

pub use error::{FolderError, FsError, FsResult};
pub use files::{compare_files, compare_files_with};
pub use folders::{compare_folders, list_files, FolderComparison};
