//! Rule Validation Stage
//!
//! A static registry maps every known datablock type to the structural
//! rules it must satisfy: properties that must reference an existing
//! datablock, properties that merely must be declared, and value
//! predicates. Validation is read-only over the project tables; for each
//! declaration it searches the declaration itself and then its ancestor
//! chain, so a rule is satisfied by an inherited property as well as a
//! local one.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{DatablockId, Project, PropertyValue};

// ═══════════════════════════════════════════════════════════════════════════════
// RULE SPECIFICATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A value predicate with the message reported when it fails.
#[derive(Clone, Copy)]
pub struct PropertyCheck {
    pub predicate: fn(&PropertyValue) -> bool,
    pub message: &'static str,
}

/// The structural rules for one datablock type.
///
/// `required_references` and `optional_references` name properties whose
/// value, wherever first found in the inheritance chain, must resolve to
/// an existing datablock; only the required ones warn when never declared
/// at all. `required_declarations` name properties that must be declared
/// somewhere in the chain, value uninspected. `checks` run a predicate on
/// the first declared value in the chain.
#[derive(Clone, Copy)]
pub struct RuleSpec {
    pub required_references: &'static [&'static str],
    pub optional_references: &'static [&'static str],
    pub required_declarations: &'static [&'static str],
    pub checks: &'static [(&'static str, PropertyCheck)],
}

const NO_RULES: RuleSpec = RuleSpec {
    required_references: &[],
    optional_references: &[],
    required_declarations: &[],
    checks: &[],
};

fn non_negative(value: &PropertyValue) -> bool {
    value.as_number().is_some_and(|n| n >= 0.0)
}

fn at_least_one(value: &PropertyValue) -> bool {
    value.as_number().is_some_and(|n| n >= 1.0)
}

fn drag_force_floor(value: &PropertyValue) -> bool {
    value.as_number().is_some_and(|n| n >= 0.01)
}

fn unit_interval(value: &PropertyValue) -> bool {
    value.as_number().is_some_and(|n| (0.0..=1.0).contains(&n))
}

fn non_empty(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Text(s) => !s.is_empty(),
        _ => true,
    }
}

lazy_static! {
    /// Rules for verifying datablock information, keyed by lowercase type
    /// name. Types without structural constraints still get an entry so
    /// the unknown-type diagnostic stays meaningful.
    static ref DATABLOCK_RULES: HashMap<&'static str, RuleSpec> = {
        let mut m = HashMap::new();

        m.insert(
            "tracerprojectiledata",
            RuleSpec {
                optional_references: &["projectile", "item", "sound", "splash", "explosion"],
                checks: &[(
                    "fizzletimems",
                    PropertyCheck {
                        predicate: non_negative,
                        message: "Cannot use negative fizzle time!",
                    },
                )],
                ..NO_RULES
            },
        );

        m.insert(
            "shapebaseimagedata",
            RuleSpec {
                required_declarations: &["shapefile"],
                ..NO_RULES
            },
        );

        m.insert(
            "itemdata",
            RuleSpec {
                optional_references: &["image"],
                checks: &[(
                    "pickupradius",
                    PropertyCheck {
                        predicate: at_least_one,
                        message: "Items should have >= 1 pickup radius.",
                    },
                )],
                ..NO_RULES
            },
        );

        m.insert(
            "audioprofile",
            RuleSpec {
                required_references: &["description"],
                ..NO_RULES
            },
        );

        m.insert(
            "jeteffectdata",
            RuleSpec {
                required_declarations: &["texture"],
                ..NO_RULES
            },
        );

        m.insert(
            "hovervehicledata",
            RuleSpec {
                required_declarations: &["catagory"],
                checks: &[
                    (
                        "dragforce",
                        PropertyCheck {
                            predicate: drag_force_floor,
                            message: "dragForce must be at least 0.01",
                        },
                    ),
                    (
                        "vertfactor",
                        PropertyCheck {
                            predicate: unit_interval,
                            message: "vertFactor must be >= 0 && <= 1.0",
                        },
                    ),
                    (
                        "floatingthrustfactor",
                        PropertyCheck {
                            predicate: unit_interval,
                            message: "floatThrustFactor must be >= 0 && <= 1.0",
                        },
                    ),
                ],
                ..NO_RULES
            },
        );

        m.insert(
            "wheeledvehicledata",
            RuleSpec {
                required_declarations: &["catagory"],
                ..NO_RULES
            },
        );

        m.insert(
            "flyingvehicledata",
            RuleSpec {
                required_declarations: &["catagory"],
                ..NO_RULES
            },
        );

        m.insert(
            "runninglightdata",
            RuleSpec {
                checks: &[(
                    "radius",
                    PropertyCheck {
                        predicate: at_least_one,
                        message: "Lights should have a radius of >= 1.",
                    },
                )],
                ..NO_RULES
            },
        );

        m.insert(
            "decaldata",
            RuleSpec {
                required_declarations: &["texturename"],
                ..NO_RULES
            },
        );

        m.insert(
            "particleemitterdata",
            RuleSpec {
                required_references: &["particles"],
                ..NO_RULES
            },
        );

        m.insert(
            "playerdata",
            RuleSpec {
                checks: &[(
                    "shapefile",
                    PropertyCheck {
                        predicate: non_empty,
                        message: "Must have a valid shapefile!",
                    },
                )],
                ..NO_RULES
            },
        );

        for name in [
            "simdatablock",
            "stationfxpersonaldata",
            "cameradata",
            "triggerdata",
            "tsshapeconstructor",
            "bombprojectiledata",
            "stationfxvehicledata",
            "staticshapedata",
            "repairprojectiledata",
            "explosiondata",
            "linearprojectiledata",
            "elfprojectiledata",
            "linearflareprojectiledata",
            "sensordata",
            "forcefieldbaredata",
            "particledata",
            "turretdata",
            "turretimagedata",
            "shockwavedata",
            "seekerprojectiledata",
            "debrisdata",
            "grenadeprojectiledata",
            "sniperprojectiledata",
            "splashdata",
            "energyprojectiledata",
            "flareprojectiledata",
            "targetprojectiledata",
            "shocklanceprojectiledata",
            "effectprofile",
            "precipitationdata",
            "commandericondata",
            "missionmarkerdata",
            "particleemissiondummydata",
            "fireballatmospheredata",
            "audiodescription",
            "lightningdata",
            "audioenvironment",
        ] {
            m.insert(name, NO_RULES);
        }

        m
    };
}

/// The rules registered for a (lowercase) datablock type, if any.
pub fn rule_for(block_type: &str) -> Option<&'static RuleSpec> {
    DATABLOCK_RULES.get(block_type)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ANCESTOR CLOSURE
// ═══════════════════════════════════════════════════════════════════════════════

/// The declaration itself plus every reachable ancestor, in depth-first
/// traversal order (self first). A redeclared parent name contributes all
/// of its physical declarations. The visited-name set bounds the walk, so
/// cyclic inheritance terminates instead of recursing forever.
pub fn ancestor_closure(project: &Project, start: DatablockId) -> Vec<DatablockId> {
    fn walk<'p>(
        project: &'p Project,
        id: DatablockId,
        visited: &mut HashSet<&'p str>,
        closure: &mut Vec<DatablockId>,
    ) {
        closure.push(id);
        for parent in &project.datablock(id).parents {
            if visited.insert(parent.as_str()) {
                for &ancestor in project.declarations_of(parent) {
                    walk(project, ancestor, visited, closure);
                }
            }
        }
    }

    let mut closure = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(project.datablock(start).name.as_str());
    walk(project, start, &mut visited, &mut closure);
    closure
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Run the rule table over every datablock declaration of the current
/// run; baseline-merged entries are lookup targets only. Read-only; every
/// finding lands in `diagnostics`, located at the declaration being
/// checked even when the offending value was inherited.
pub fn validate(project: &Project, diagnostics: &mut Vec<Diagnostic>) {
    for index in 0..project.analyzed_datablocks() {
        let id = DatablockId(index as u32);
        let decl = project.datablock(id);

        let Some(rule) = rule_for(&decl.block_type) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownType,
                format!(
                    "Unknown datablock type '{}'! The analyzer does not know how to check this datablock. (Declaration in {})",
                    decl.block_type, decl.location
                ),
                &decl.location,
            ));
            continue;
        };

        let closure = ancestor_closure(project, id);

        check_references(project, id, &closure, rule, diagnostics);
        check_required_declarations(project, id, &closure, rule, diagnostics);
        run_property_checks(project, id, &closure, rule, diagnostics);
    }
}

/// First declaration in the closure defining `key`, if any.
fn first_defining<'p>(
    project: &'p Project,
    closure: &[DatablockId],
    key: &str,
) -> Option<&'p PropertyValue> {
    closure
        .iter()
        .find_map(|&ancestor| project.datablock(ancestor).properties.get(key))
}

fn check_references(
    project: &Project,
    id: DatablockId,
    closure: &[DatablockId],
    rule: &RuleSpec,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let decl = project.datablock(id);

    for &reference in rule
        .required_references
        .iter()
        .chain(rule.optional_references.iter())
    {
        match first_defining(project, closure, reference) {
            Some(value) => {
                let resolves = value
                    .as_name()
                    .is_some_and(|name| {
                        project.datablocks_by_name.contains_key(&name.to_lowercase())
                    });
                if !resolves {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::DanglingReference,
                        format!(
                            "{} datablock '{}' references '{}' in property '{}', which does not exist! (Declaration in {})",
                            decl.block_type, decl.name, value, reference, decl.location
                        ),
                        &decl.location,
                    ));
                }
            }
            None => {
                if rule.required_references.contains(&reference) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::MissingReference,
                        format!(
                            "{} datablock '{}' has no '{}' declaration! (Declaration in {})",
                            decl.block_type, decl.name, reference, decl.location
                        ),
                        &decl.location,
                    ));
                }
            }
        }
    }
}

fn check_required_declarations(
    project: &Project,
    id: DatablockId,
    closure: &[DatablockId],
    rule: &RuleSpec,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let decl = project.datablock(id);

    for &declaration in rule.required_declarations {
        if first_defining(project, closure, declaration).is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingDeclaration,
                format!(
                    "{} datablock '{}' required property '{}' not declared or inherited! (Declaration in {})",
                    decl.block_type, decl.name, declaration, decl.location
                ),
                &decl.location,
            ));
        }
    }
}

fn run_property_checks(
    project: &Project,
    id: DatablockId,
    closure: &[DatablockId],
    rule: &RuleSpec,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let decl = project.datablock(id);

    for (key, check) in rule.checks {
        match first_defining(project, closure, key) {
            None => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::PropertyNotDeclared,
                    format!(
                        "{} datablock '{}' property '{}' not declared and parent datablocks do not declare it! (Declaration in {})",
                        decl.block_type, decl.name, key, decl.location
                    ),
                    &decl.location,
                ));
            }
            Some(value) => {
                if !(check.predicate)(value) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::FailedCheck,
                        format!(
                            "Property warning (datablock '{}', type {}. Declaration in {}): {}",
                            decl.name, decl.block_type, decl.location, check.message
                        ),
                        &decl.location,
                    ));
                }
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
