//! Inheritance Resolution Stage
//!
//! Checks every authored parent name against the aggregated datablock
//! table. Unknown parents are pruned with a warning; known parents stay
//! and denote every physical declaration under that name, all of which
//! are eligible ancestors for the rule validator's chain search. After
//! this stage no parent reference is left dangling.

use std::collections::BTreeSet;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::Project;

pub fn resolve_parents(project: &mut Project, diagnostics: &mut Vec<Diagnostic>) {
    let known: BTreeSet<String> = project.datablocks_by_name.keys().cloned().collect();

    // Baseline-merged entries were resolved by the run that exported
    // them; only the current run's declarations are checked.
    let analyzed = project.analyzed_datablocks();
    for decl in project.datablocks[..analyzed].iter_mut() {
        let name = decl.name.clone();
        let location = decl.location.clone();

        decl.parents.retain(|parent| {
            let exists = known.contains(parent);
            if !exists {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownParent,
                    format!(
                        "Datablock '{}' derives from non-existent parent '{}'! (Declaration in {})",
                        name, parent, location
                    ),
                    &location,
                ));
            }
            exists
        });
    }
}
