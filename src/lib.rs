//! # tsscan: a TorqueScript static analyzer
//!
//! Scans a tree of TorqueScript source files and recovers the entities a
//! mod declares (global functions, type-bound functions, and datablocks)
//! and validates cross-file consistency.
//!
//! ## Pipeline Invariants
//!
//! 1. **Extraction is pure**: one task per file, input path in, entity set
//!    out, nothing shared. The parallel parse stage is a plain map.
//! 2. **Barrier before aggregation**: no project-wide table is touched
//!    until every extraction task has completed or failed with a report.
//!    Symbol identity and inheritance require the complete file set.
//! 3. **Identity is a handle**: symbols live in arenas; "the same
//!    declaration" means equal ids, never equal field values.
//! 4. **Deterministic diagnostics**: files are merged in path order, so
//!    the "original declaration" a warning names is stable across runs.
//! 5. **No parent dangles**: after resolution every parent name on every
//!    declaration of the current run resolves to at least one physical
//!    declaration. Baseline entries were resolved by the run that
//!    exported them and are a lookup layer here, never re-analyzed.
//! 6. **Warnings are never fatal**: only a missing target directory
//!    aborts; everything else becomes exactly one diagnostic and the run
//!    still produces a full result model.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

mod aggregate;
mod baseline;
mod diagnostics;
mod discovery;
mod extract;
mod inherit;
mod model;
mod rules;

#[cfg(test)]
mod pipeline_tests;

pub use baseline::{merge_baseline, Baseline};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use discovery::{find_script_files, SCRIPT_EXTENSION};
pub use extract::{extract_file, extract_source};
pub use model::{
    DatablockDecl, DatablockId, FileEntities, FileReport, FunctionId, FunctionSymbol, Project,
    PropertyValue, SourceLocation,
};
pub use rules::{ancestor_closure, rule_for, PropertyCheck, RuleSpec};

/// Errors that abort a run. Everything recoverable is a [`Diagnostic`]
/// instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no such directory to scan: '{0}'")]
    MissingDirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// The complete output of one run: the project tables plus the ordered
/// diagnostic side channel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub project: Project,
    pub diagnostics: Vec<Diagnostic>,
}

/// Pipeline configuration and entry point.
///
/// ```no_run
/// use tsscan::Analyzer;
///
/// let analysis = Analyzer::new(vec!["scripts".into()])
///     .jobs(4)
///     .run()
///     .unwrap();
/// for diagnostic in &analysis.diagnostics {
///     eprintln!("Warning: {}", diagnostic.message);
/// }
/// ```
pub struct Analyzer {
    targets: Vec<PathBuf>,
    jobs: usize,
    baseline: Option<Baseline>,
}

impl Analyzer {
    pub fn new(targets: Vec<PathBuf>) -> Self {
        Self {
            targets,
            jobs: 0,
            baseline: None,
        }
    }

    /// Worker threads for the parse stage; 0 runs it sequentially on the
    /// caller's thread.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Merge a previously exported datablock table under this run.
    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Run the full pipeline: discover → extract (parallel, then barrier)
    /// → aggregate → merge baseline → resolve inheritance → validate.
    pub fn run(&self) -> Result<Analysis, ScanError> {
        // Directory-level absence is the one fatal condition, checked
        // before any stage begins.
        for target in &self.targets {
            if !target.is_dir() {
                return Err(ScanError::MissingDirectory(target.clone()));
            }
        }

        let mut files = Vec::new();
        for target in &self.targets {
            info!("building file list for directory {:?}", target);
            files.extend(discovery::find_script_files(target));
        }
        files.sort();
        files.dedup();

        let mut diagnostics = Vec::new();

        info!(files = files.len(), jobs = self.jobs, "performing parse stage");
        let entities = discovery::run_extraction(files, self.jobs, &mut diagnostics)?;

        info!("performing declaration analysis");
        let mut project = aggregate::aggregate(entities, &mut diagnostics);

        if let Some(baseline) = &self.baseline {
            info!(
                names = baseline.datablocks.len(),
                "merging baseline datablock table"
            );
            baseline::merge_baseline(&mut project, baseline);
        }

        info!("performing datablock inheritance analysis");
        inherit::resolve_parents(&mut project, &mut diagnostics);

        info!("performing datablock reference analysis");
        rules::validate(&project, &mut diagnostics);

        info!(warnings = diagnostics.len(), "done");
        Ok(Analysis {
            project,
            diagnostics,
        })
    }
}
