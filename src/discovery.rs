//! Discovery Stage
//!
//! Recursively scans target directories for script files and runs the
//! extraction stage over them. Extraction is a pure map over owned file
//! paths: each task reads its own file and returns an owned result, so
//! the parallel path shares no mutable state and the `collect` below is
//! the synchronization barrier the later stages rely on: aggregation
//! never starts until every file has either produced entities or a
//! reported failure.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::extract::extract_file;
use crate::model::{FileEntities, SourceLocation};
use crate::ScanError;

/// Only files with this extension are considered script sources.
pub const SCRIPT_EXTENSION: &str = "cs";

/// Recursively find all script files under a directory. Symlinks are not
/// followed. Unwalkable entries are logged and skipped. Traversal order
/// is not meaningful; the aggregator imposes determinism by sorting.
pub fn find_script_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!("skipping unwalkable entry under {:?}: {}", dir, error);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }

    files
}

/// Run extraction over every file, with `jobs` worker threads (0 runs
/// sequentially on the caller's thread). Unreadable files become
/// diagnostics and are excluded; they never abort the run for the rest
/// of the project.
pub fn run_extraction(
    files: Vec<PathBuf>,
    jobs: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Vec<FileEntities>, ScanError> {
    let results: Vec<Result<FileEntities, ScanError>> = if jobs == 0 {
        files.iter().map(|path| extract_file(path)).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(|| files.par_iter().map(|path| extract_file(path)).collect())
    };

    // Barrier passed: every task has completed before anything is merged.
    let mut entities = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(file) => {
                debug!(
                    path = %file.path,
                    globals = file.global_functions.len(),
                    bound = file.bound_functions.len(),
                    datablocks = file.datablocks.len(),
                    "extracted file"
                );
                entities.push(file);
            }
            Err(error) => {
                warn!("{error}");
                let location = match &error {
                    ScanError::Unreadable { path, .. } => {
                        SourceLocation::new(&path.to_string_lossy(), 0)
                    }
                    _ => SourceLocation::new("<unknown>", 0),
                };
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnreadableFile,
                    error.to_string(),
                    &location,
                ));
            }
        }
    }

    Ok(entities)
}
