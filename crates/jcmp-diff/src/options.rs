use std::collections::BTreeSet;

use jcmp_params::IdParamTree;
use jcmp_types::FileKind;

use crate::error::{DiffError, DiffResult};

/// Default number of folder workers.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Configuration for one comparison run.
///
/// Built once, then shared read-only by every worker of a folder run.
#[derive(Clone, Debug)]
pub struct ComparisonOptions {
    /// Format of the compared documents.
    pub file_kind: FileKind,
    /// Identification parameters for the arrays of the documents.
    pub params: IdParamTree,
    /// Number of folder workers (at least 1).
    pub parallelism: usize,
    /// Skip duplicate-identity checks; the last colliding element wins.
    pub fast: bool,
    /// Stop a folder run at the first pair of files that differ.
    pub stop_at_first: bool,
    /// File names left out of folder runs.
    pub ignored: BTreeSet<String>,
    /// Only log errors.
    pub silent: bool,
    /// Display raw objects when no alias template applies.
    pub allow_raw: bool,
    /// Key objects by `#<position>` when no identity rule applies.
    pub index_fallback: bool,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            file_kind: FileKind::Json,
            params: IdParamTree::empty(),
            parallelism: DEFAULT_PARALLELISM,
            fast: false,
            stop_at_first: false,
            ignored: BTreeSet::new(),
            silent: false,
            allow_raw: true,
            index_fallback: false,
        }
    }
}

impl ComparisonOptions {
    /// Options with the given identification parameters and defaults elsewhere.
    pub fn new(params: IdParamTree) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn with_file_kind(mut self, file_kind: FileKind) -> Self {
        self.file_kind = file_kind;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn with_stop_at_first(mut self, stop_at_first: bool) -> Self {
        self.stop_at_first = stop_at_first;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_allow_raw(mut self, allow_raw: bool) -> Self {
        self.allow_raw = allow_raw;
        self
    }

    pub fn with_index_fallback(mut self, index_fallback: bool) -> Self {
        self.index_fallback = index_fallback;
        self
    }

    /// Ignore the names of a comma-separated list. Blank items are skipped.
    pub fn with_ignored_list(mut self, list: &str) -> Self {
        self.ignored.extend(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Whether a file name is left out of folder runs.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Check that the options can drive a run.
    pub fn validate(&self) -> DiffResult<()> {
        if self.parallelism == 0 {
            return Err(DiffError::InvalidOptions(
                "parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
