//! Diagnostic records for the analysis pipeline.
//!
//! Every non-fatal condition the pipeline detects produces exactly one
//! diagnostic; stages append to a shared ordered list and never print
//! directly. Each kind carries a stable code so downstream tooling can
//! filter without parsing message text.

use crate::model::SourceLocation;
use serde::{Deserialize, Serialize};

pub const DIAG_UNREADABLE_FILE: &str = "TS-W-IO";
pub const DIAG_GLOBAL_REDECLARED: &str = "TS-W-REDECL-GLOBAL";
pub const DIAG_GLOBAL_REDECLARED_ARITY: &str = "TS-W-REDECL-GLOBAL-ARITY";
pub const DIAG_BOUND_REDECLARED: &str = "TS-W-REDECL-BOUND";
pub const DIAG_BOUND_REDECLARED_ARITY: &str = "TS-W-REDECL-BOUND-ARITY";
pub const DIAG_DATABLOCK_REDECLARED: &str = "TS-W-REDECL-DATABLOCK";
pub const DIAG_UNKNOWN_PARENT: &str = "TS-W-PARENT";
pub const DIAG_UNKNOWN_TYPE: &str = "TS-W-TYPE";
pub const DIAG_DANGLING_REFERENCE: &str = "TS-W-REF-DANGLING";
pub const DIAG_MISSING_REFERENCE: &str = "TS-W-REF-MISSING";
pub const DIAG_MISSING_DECLARATION: &str = "TS-W-DECL-MISSING";
pub const DIAG_PROPERTY_NOT_DECLARED: &str = "TS-W-CHECK-MISSING";
pub const DIAG_FAILED_CHECK: &str = "TS-W-CHECK-FAILED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnreadableFile,
    GlobalRedeclared,
    GlobalRedeclaredArity,
    BoundRedeclared,
    BoundRedeclaredArity,
    DatablockRedeclared,
    UnknownParent,
    UnknownType,
    DanglingReference,
    MissingReference,
    MissingDeclaration,
    PropertyNotDeclared,
    FailedCheck,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            DiagnosticKind::UnreadableFile => DIAG_UNREADABLE_FILE,
            DiagnosticKind::GlobalRedeclared => DIAG_GLOBAL_REDECLARED,
            DiagnosticKind::GlobalRedeclaredArity => DIAG_GLOBAL_REDECLARED_ARITY,
            DiagnosticKind::BoundRedeclared => DIAG_BOUND_REDECLARED,
            DiagnosticKind::BoundRedeclaredArity => DIAG_BOUND_REDECLARED_ARITY,
            DiagnosticKind::DatablockRedeclared => DIAG_DATABLOCK_REDECLARED,
            DiagnosticKind::UnknownParent => DIAG_UNKNOWN_PARENT,
            DiagnosticKind::UnknownType => DIAG_UNKNOWN_TYPE,
            DiagnosticKind::DanglingReference => DIAG_DANGLING_REFERENCE,
            DiagnosticKind::MissingReference => DIAG_MISSING_REFERENCE,
            DiagnosticKind::MissingDeclaration => DIAG_MISSING_DECLARATION,
            DiagnosticKind::PropertyNotDeclared => DIAG_PROPERTY_NOT_DECLARED,
            DiagnosticKind::FailedCheck => DIAG_FAILED_CHECK,
        }
    }

    /// The property each diagnostic guards.
    pub fn summary(self) -> &'static str {
        match self {
            DiagnosticKind::UnreadableFile => "Every discovered script file is read and parsed.",
            DiagnosticKind::GlobalRedeclared | DiagnosticKind::GlobalRedeclaredArity => {
                "Each global function name is declared once."
            }
            DiagnosticKind::BoundRedeclared | DiagnosticKind::BoundRedeclaredArity => {
                "Each type::name pair is declared once."
            }
            DiagnosticKind::DatablockRedeclared => "Each datablock name is declared once.",
            DiagnosticKind::UnknownParent => "Every declared parent names an existing datablock.",
            DiagnosticKind::UnknownType => "Every datablock type has registered rules.",
            DiagnosticKind::DanglingReference => {
                "Reference properties point at existing datablocks."
            }
            DiagnosticKind::MissingReference => {
                "Required reference properties are declared or inherited."
            }
            DiagnosticKind::MissingDeclaration => {
                "Required properties are declared or inherited."
            }
            DiagnosticKind::PropertyNotDeclared => {
                "Checked properties are declared or inherited."
            }
            DiagnosticKind::FailedCheck => "Property values satisfy their type's predicates.",
        }
    }
}

/// One warning record. `file`/`line` is the declaration the user should
/// look at, which for inherited rule failures is the declaration being
/// checked rather than the ancestor that supplied the value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: String,
    pub line: u32,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: String, location: &SourceLocation) -> Self {
        Self {
            code: kind.code().to_string(),
            kind,
            message,
            file: location.file.clone(),
            line: location.line,
        }
    }
}
