//! Baseline Layer
//!
//! A previously exported datablock table can be merged under the current
//! run as a base layer: names the current run declares win outright, and
//! names only the base layer knows are added silently — they never count
//! as redeclarations and are never re-analyzed themselves, but they do
//! resolve as parents and reference targets. Load is tolerant: a missing
//! or corrupt baseline file is treated as no baseline at all.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::model::{DatablockDecl, Project};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub datablocks: BTreeMap<String, Vec<DatablockDecl>>,
}

impl Baseline {
    pub fn load(path: &Path) -> Option<Baseline> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(error) => {
                warn!("baseline {:?} not readable: {}", path, error);
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(baseline) => Some(baseline),
            Err(error) => {
                warn!("baseline {:?} not parseable, ignoring: {}", path, error);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let data = serde_json::to_string(self)?;
        fs::write(path, data)
    }

    /// Export the datablock table of a finished run. Alias handles are
    /// run-local and dropped; they mean nothing to a later run's arena.
    pub fn from_project(project: &Project) -> Baseline {
        let mut datablocks: BTreeMap<String, Vec<DatablockDecl>> = BTreeMap::new();
        for (name, ids) in &project.datablocks_by_name {
            let decls = ids
                .iter()
                .map(|&id| {
                    let mut decl = project.datablock(id).clone();
                    decl.aliases.clear();
                    decl
                })
                .collect();
            datablocks.insert(name.clone(), decls);
        }
        Baseline { datablocks }
    }
}

/// Merge a baseline under the current project. Runs between aggregation
/// and inheritance resolution so base entries can serve as parents. The
/// watermark keeps later stages off the merged entries: they are a
/// lookup layer, not part of the run being analyzed.
pub fn merge_baseline(project: &mut Project, baseline: &Baseline) {
    project.baseline_watermark = Some(project.datablocks.len() as u32);

    for (name, decls) in &baseline.datablocks {
        if project.datablocks_by_name.contains_key(name) {
            continue;
        }

        let ids = decls
            .iter()
            .map(|decl| {
                let mut decl = decl.clone();
                decl.aliases.clear();
                project.push_datablock(decl)
            })
            .collect();
        project.datablocks_by_name.insert(name.clone(), ids);
    }
}
