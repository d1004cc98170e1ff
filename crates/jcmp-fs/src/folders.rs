//! Parallel comparison of two folders.
//!
//! The sorted file names of the first folder are cut into contiguous,
//! statically assigned chunks, one per worker. Each worker compares its
//! files against the same names in the second folder, accumulates results
//! locally, and merges them into shared state under a single mutex once it
//! is done. Files present only in the second folder are recorded after all
//! workers have joined.
//!
//! # Invariants
//!
//! - A file's delta is merged only after its comparison completed, so the
//!   result never holds half a file.
//! - `visited + skipped` equals the number of files listed in the first
//!   folder once all workers have joined.
//! - Workers only look at the stop flag between two files.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, info};

use jcmp_codec::DocumentLoader;
use jcmp_diff::{ComparisonOptions, DiffNode};
use jcmp_types::Value;

use crate::error::{FolderError, FsError, FsResult};
use crate::files::compare_files_with;

/// Result of a folder comparison.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FolderComparison {
    /// Differences keyed by file name.
    pub delta: DiffNode,
    /// Names of the files of the first folder whose result is in `delta`,
    /// sorted. Identical files are listed even though `delta` omits them.
    pub compared: Vec<String>,
    /// Names present in the first folder only, sorted.
    pub only_in_first: Vec<String>,
    /// Names present in the second folder only, sorted.
    pub only_in_second: Vec<String>,
    /// Files of the first folder that were processed.
    pub visited: usize,
    /// Files of the first folder left untouched after the run was stopped.
    pub skipped: usize,
    /// Whether the run stopped early (first difference or an error).
    pub stopped: bool,
}

impl FolderComparison {
    /// Returns `true` if no difference was found.
    pub fn is_unchanged(&self) -> bool {
        self.delta.is_unchanged()
    }
}

/// State shared by the workers of one run.
#[derive(Default)]
struct Shared {
    result: FolderComparison,
    error: Option<FsError>,
}

/// What a worker accumulated over its chunk.
#[derive(Default)]
struct WorkerOutcome {
    delta: DiffNode,
    compared: Vec<String>,
    only_in_first: Vec<String>,
    visited: usize,
    skipped: usize,
    error: Option<FsError>,
}

/// List the regular files of `dir`, minus ignored names, sorted.
pub fn list_files(dir: &Path, options: &ComparisonOptions) -> FsResult<Vec<String>> {
    let listing_error = |source| FsError::Listing {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(listing_error)? {
        let entry = entry.map_err(listing_error)?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if options.is_ignored(&name) {
            debug!(name = %name, "ignoring file");
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Compare the files of two folders, pairing them by name.
///
/// On failure the first error is returned together with everything merged
/// before the run stopped.
pub fn compare_folders(
    first_dir: &Path,
    second_dir: &Path,
    options: &ComparisonOptions,
    loader: &dyn DocumentLoader,
) -> Result<FolderComparison, FolderError> {
    options.validate().map_err(FsError::from)?;

    let first_names = list_files(first_dir, options)?;
    let second_names = list_files(second_dir, options)?;
    let second_set: BTreeSet<&str> = second_names.iter().map(String::as_str).collect();
    let total = first_names.len();

    let workers = options.parallelism.min(total).max(1);
    let chunk_size = total / workers;
    if !options.silent {
        info!(
            first = %first_dir.display(),
            second = %second_dir.display(),
            files = total,
            workers,
            "comparing folders"
        );
    }

    let shared = Mutex::new(Shared::default());
    let stop = AtomicBool::new(false);
    let mut panicked = false;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|index| {
                let start = index * chunk_size;
                let end = if index + 1 == workers { total } else { start + chunk_size };
                let chunk = &first_names[start..end];
                let (shared, stop, second_set) = (&shared, &stop, &second_set);

                scope.spawn(move || {
                    let outcome = run_worker(
                        chunk, first_dir, second_dir, second_set, options, loader, stop,
                    );
                    if !options.silent {
                        info!(
                            worker = index,
                            visited = outcome.visited,
                            skipped = outcome.skipped,
                            "folder worker done"
                        );
                    }
                    merge(shared, outcome);
                })
            })
            .collect();

        for handle in handles {
            panicked |= handle.join().is_err();
        }
    });

    let Shared { mut result, error } = shared
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    result.stopped = stop.load(Ordering::SeqCst);
    result.compared.sort();
    result.only_in_first.sort();

    if panicked {
        return Err(failure(FsError::WorkerPanicked, result));
    }
    if result.visited + result.skipped != total {
        let mismatch = FsError::CountMismatch {
            visited: result.visited,
            skipped: result.skipped,
            total,
        };
        return Err(failure(mismatch, result));
    }
    if let Some(error) = error {
        return Err(failure(error, result));
    }

    if !result.stopped {
        let first_set: BTreeSet<&str> = first_names.iter().map(String::as_str).collect();
        for name in second_names.iter().filter(|n| !first_set.contains(n.as_str())) {
            let path = second_dir.join(name);
            result
                .delta
                .insert(name.clone(), DiffNode::OnlyInSecond(path_value(&path)));
            result.only_in_second.push(name.clone());
        }
    }

    if !options.silent {
        info!(
            compared = result.compared.len(),
            only_in_first = result.only_in_first.len(),
            only_in_second = result.only_in_second.len(),
            differing = result.delta.entries().count(),
            stopped = result.stopped,
            "folder comparison done"
        );
    }
    Ok(result)
}

fn run_worker(
    chunk: &[String],
    first_dir: &Path,
    second_dir: &Path,
    second_set: &BTreeSet<&str>,
    options: &ComparisonOptions,
    loader: &dyn DocumentLoader,
    stop: &AtomicBool,
) -> WorkerOutcome {
    let mut outcome = WorkerOutcome::default();

    for (position, name) in chunk.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            outcome.skipped += chunk.len() - position;
            break;
        }
        outcome.visited += 1;

        let first_path = first_dir.join(name);
        let node = if second_set.contains(name.as_str()) {
            match compare_files_with(loader, &first_path, &second_dir.join(name), options) {
                Ok(node) => node,
                Err(error) => {
                    outcome.error = Some(FsError::File {
                        name: name.clone(),
                        source: Box::new(error),
                    });
                    outcome.skipped += chunk.len() - position - 1;
                    stop.store(true, Ordering::SeqCst);
                    break;
                }
            }
        } else {
            outcome.only_in_first.push(name.clone());
            DiffNode::OnlyInFirst(path_value(&first_path))
        };

        if !node.is_unchanged() && options.stop_at_first {
            stop.store(true, Ordering::SeqCst);
        }
        outcome.delta.insert(name.clone(), node);
        outcome.compared.push(name.clone());
    }

    outcome
}

fn merge(shared: &Mutex<Shared>, outcome: WorkerOutcome) {
    let mut shared = shared.lock().expect("lock poisoned");
    let result = &mut shared.result;
    result.delta.merge(outcome.delta);
    result.compared.extend(outcome.compared);
    result.only_in_first.extend(outcome.only_in_first);
    result.visited += outcome.visited;
    result.skipped += outcome.skipped;
    if shared.error.is_none() {
        shared.error = outcome.error;
    }
}

fn failure(error: FsError, partial: FolderComparison) -> FolderError {
    FolderError {
        error,
        partial: Box::new(partial),
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}
