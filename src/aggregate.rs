//! Aggregation Stage
//!
//! Merges per-file entity sets into the project-wide tables. Files are
//! sorted by path first so the "original declaration" named by a
//! redeclaration warning is the same on every run regardless of how the
//! extraction tasks finished. The first occurrence of a key becomes
//! canonical; later occurrences are linked to it (and it to them) as
//! aliases. The scripting language permits redefinition, so all of
//! these are warnings, never errors.

use std::collections::btree_map::Entry;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{FileEntities, FileReport, FunctionId, Project};

pub fn aggregate(mut files: Vec<FileEntities>, diagnostics: &mut Vec<Diagnostic>) -> Project {
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut project = Project::default();

    for file in files {
        let mut report = FileReport::new(&file.path);

        for symbol in file.global_functions {
            let name = symbol.name.clone();
            let id = project.push_function(symbol);
            report.global_functions.push(id);

            match project.globals.entry(name) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                }
                Entry::Occupied(occupied) => {
                    let canonical = *occupied.get();
                    note_function_redeclaration(&mut project, canonical, id, diagnostics);
                }
            }
        }

        for symbol in file.bound_functions {
            let owner = symbol
                .owner
                .clone()
                .unwrap_or_default();
            let name = symbol.name.clone();
            let id = project.push_function(symbol);
            report
                .bound_functions
                .entry(owner.clone())
                .or_default()
                .push(id);

            match project.bound.entry(owner).or_default().entry(name) {
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                }
                Entry::Occupied(occupied) => {
                    let canonical = *occupied.get();
                    note_function_redeclaration(&mut project, canonical, id, diagnostics);
                }
            }
        }

        for decl in file.datablocks {
            let name = decl.name.clone();
            let id = project.push_datablock(decl);
            report.datablocks.push(id);

            let list = project.datablocks_by_name.entry(name).or_default();
            if let Some(&first) = list.first() {
                list.push(id);
                project.datablock_mut(first).aliases.push(id);
                project.datablock_mut(id).aliases.push(first);
            } else {
                list.push(id);
            }
        }

        project.files.push(report);
    }

    note_datablock_redeclarations(&project, diagnostics);

    project
}

/// Link the duplicate to the canonical entry both ways and emit the
/// warning, distinguishing a changed parameter count from a plain
/// redefinition.
fn note_function_redeclaration(
    project: &mut Project,
    canonical: FunctionId,
    duplicate: FunctionId,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (qualified, original_location, original_arity) = {
        let known = project.function(canonical);
        (
            known.qualified_name(),
            known.location.clone(),
            known.parameters.len(),
        )
    };
    let (location, arity, bound) = {
        let later = project.function(duplicate);
        (
            later.location.clone(),
            later.parameters.len(),
            later.owner.is_some(),
        )
    };

    project.function_mut(canonical).aliases.push(duplicate);
    project.function_mut(duplicate).aliases.push(canonical);

    let what = if bound { "Bound" } else { "Global" };
    let (kind, message) = if arity != original_arity {
        (
            if bound {
                DiagnosticKind::BoundRedeclaredArity
            } else {
                DiagnosticKind::GlobalRedeclaredArity
            },
            format!(
                "{} function '{}' redeclared with {} parameters in {}! (Original declaration in {} with {} parameters)",
                what, qualified, arity, location, original_location, original_arity
            ),
        )
    } else {
        (
            if bound {
                DiagnosticKind::BoundRedeclared
            } else {
                DiagnosticKind::GlobalRedeclared
            },
            format!(
                "{} function '{}' redeclared in {}! (Original declaration in {})",
                what, qualified, location, original_location
            ),
        )
    };

    diagnostics.push(Diagnostic::new(kind, message, &location));
}

/// One warning per redeclared datablock name, enumerating every physical
/// declaration.
fn note_datablock_redeclarations(project: &Project, diagnostics: &mut Vec<Diagnostic>) {
    for (name, ids) in &project.datablocks_by_name {
        if ids.len() < 2 {
            continue;
        }

        let locations: Vec<String> = ids
            .iter()
            .map(|&id| {
                let decl = project.datablock(id);
                format!("{}:{}", decl.location.file, decl.location.line)
            })
            .collect();

        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DatablockRedeclared,
            format!(
                "Datablock '{}' redeclared {} times! (in {})",
                name,
                ids.len(),
                locations.join(", ")
            ),
            &project.datablock(ids[0]).location,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_source;
    use crate::model::DatablockId;

    fn aggregate_sources(sources: &[(&str, &str)]) -> (Project, Vec<Diagnostic>) {
        let files = sources
            .iter()
            .map(|(path, source)| extract_source(source, path))
            .collect();
        let mut diagnostics = Vec::new();
        let project = aggregate(files, &mut diagnostics);
        (project, diagnostics)
    }

    #[test]
    fn test_plain_redeclaration_links_aliases_both_ways() {
        let (project, diagnostics) = aggregate_sources(&[
            ("a.cs", "function spawn(%a) {}\n"),
            ("b.cs", "function spawn(%x) {}\n"),
        ]);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::GlobalRedeclared);

        let canonical = project.globals["spawn"];
        assert_eq!(project.function(canonical).location.file, "a.cs");
        let other = project.function(canonical).aliases[0];
        assert_eq!(project.function(other).aliases, vec![canonical]);
    }

    #[test]
    fn test_arity_change_uses_parameter_count_variant() {
        let (_, diagnostics) = aggregate_sources(&[
            ("a.cs", "function spawn(%a) {}\n"),
            ("b.cs", "function spawn(%x, %y) {}\n"),
        ]);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::GlobalRedeclaredArity);
        assert!(diagnostics[0].message.contains("2 parameters"));
        assert!(diagnostics[0].message.contains("1 parameters"));
    }

    #[test]
    fn test_original_declaration_follows_path_order() {
        // b.cs is handed over first, but the path sort still makes a.cs
        // the original declaration.
        let (project, diagnostics) = aggregate_sources(&[
            ("b.cs", "function spawn() {}\n"),
            ("a.cs", "function spawn() {}\n"),
        ]);

        assert_eq!(project.function(project.globals["spawn"]).location.file, "a.cs");
        assert!(diagnostics[0].message.contains("Original declaration in a.cs"));
    }

    #[test]
    fn test_bound_functions_keyed_by_type_and_name() {
        let (project, diagnostics) = aggregate_sources(&[
            ("a.cs", "function Alpha::update() {}\n"),
            ("b.cs", "function Beta::update() {}\n"),
        ]);

        // Same bare name, different owners: never aliases of each other.
        assert!(diagnostics.is_empty());
        let alpha = project.bound["alpha"]["update"];
        let beta = project.bound["beta"]["update"];
        assert!(project.function(alpha).aliases.is_empty());
        assert!(project.function(beta).aliases.is_empty());
    }

    #[test]
    fn test_bound_redeclaration_detected() {
        let (_, diagnostics) = aggregate_sources(&[
            ("a.cs", "function Alpha::update() {}\n"),
            ("b.cs", "function Alpha::update() {}\n"),
        ]);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::BoundRedeclared);
        assert!(diagnostics[0].message.contains("alpha::update"));
    }

    #[test]
    fn test_datablock_redeclaration_keeps_every_declaration() {
        let (project, diagnostics) = aggregate_sources(&[
            ("a.cs", "datablock ItemData(Coin)\n{\n};\n"),
            ("b.cs", "datablock ItemData(Coin)\n{\n};\n"),
            ("c.cs", "datablock ItemData(Coin)\n{\n};\n"),
        ]);

        assert_eq!(project.datablocks_by_name["coin"].len(), 3);
        let redecls: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::DatablockRedeclared)
            .collect();
        assert_eq!(redecls.len(), 1);
        assert!(redecls[0].message.contains("3 times"));
        assert!(redecls[0].message.contains("a.cs:1"));
        assert!(redecls[0].message.contains("c.cs:1"));

        // First declaration aliases each later one, and vice versa.
        let first = project.datablocks_by_name["coin"][0];
        assert_eq!(project.datablock(first).aliases.len(), 2);
        for &later in &project.datablocks_by_name["coin"][1..] {
            assert_eq!(project.datablock(later).aliases, vec![first]);
        }
        assert_eq!(first, DatablockId(0));
    }

    #[test]
    fn test_datablock_identity_is_name_only() {
        // Same name under two different types still collides.
        let (project, diagnostics) = aggregate_sources(&[
            ("a.cs", "datablock ItemData(Thing)\n{\n};\n"),
            ("b.cs", "datablock ExplosionData(Thing)\n{\n};\n"),
        ]);

        assert_eq!(project.datablocks_by_name["thing"].len(), 2);
        assert!(diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DatablockRedeclared));
    }
}
