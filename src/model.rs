//! Data Model for the TorqueScript Scanner
//!
//! Entities produced by extraction and the project-wide tables built from
//! them. Symbols live in arenas and are referred to by integer handles;
//! two declarations are "the same symbol" only when their handles are
//! equal, never because their fields happen to match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS & HANDLES
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a declaration was found. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: &str, line: u32) -> Self {
        Self {
            file: file.to_string(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, line {}", self.file, self.line)
    }
}

/// Handle into [`Project::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionId(pub u32);

/// Handle into [`Project::datablocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatablockId(pub u32);

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTY VALUES
// ═══════════════════════════════════════════════════════════════════════════════

/// A datablock property value. Classification is positional: a leading `$`
/// makes a global reference, a leading quote makes text, anything else is
/// tried as a number and kept verbatim as text when that fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    GlobalReference(String),
}

impl PropertyValue {
    pub fn classify(raw: &str) -> Self {
        if let Some(name) = raw.strip_prefix('$') {
            return PropertyValue::GlobalReference(name.to_string());
        }
        if let Some(rest) = raw.strip_prefix('"') {
            let inner = match rest.rfind('"') {
                Some(end) => &rest[..end],
                None => rest,
            };
            return PropertyValue::Text(inner.to_string());
        }
        match raw.parse::<f64>() {
            Ok(number) => PropertyValue::Number(number),
            Err(_) => PropertyValue::Text(raw.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Both text and global-reference values are accepted where a datablock
    /// name is expected; numbers never name anything.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) | PropertyValue::GlobalReference(s) => Some(s),
            PropertyValue::Number(_) => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::GlobalReference(s) => write!(f, "${}", s),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOLS
// ═══════════════════════════════════════════════════════════════════════════════

/// A declared function. `owner` is the type name for bound functions
/// (`Type::name` declarations) and `None` for globals. Names are lowercased
/// at extraction; parameter tokens keep their original casing since they
/// are documentation, not lookup keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSymbol {
    pub name: String,
    pub owner: Option<String>,
    pub parameters: Vec<String>,
    pub location: SourceLocation,
    pub aliases: Vec<FunctionId>,
}

impl FunctionSymbol {
    pub fn new(
        name: String,
        owner: Option<String>,
        parameters: Vec<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            owner,
            parameters,
            location,
            aliases: Vec::new(),
        }
    }

    /// `type::name` for bound functions, the bare name otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// One physical datablock declaration. The identity key is the bare name;
/// a project may hold several declarations under one name, and they are
/// tracked individually rather than collapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatablockDecl {
    pub name: String,
    pub block_type: String,
    pub parents: Vec<String>,
    pub properties: BTreeMap<String, PropertyValue>,
    pub location: SourceLocation,
    pub aliases: Vec<DatablockId>,
}

impl DatablockDecl {
    pub fn new(
        name: String,
        block_type: String,
        parents: Vec<String>,
        properties: BTreeMap<String, PropertyValue>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name,
            block_type,
            parents,
            properties,
            location,
            aliases: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-FILE EXTRACTION OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything recognized in one source file. Pure output of the extractor;
/// carries no project-wide state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntities {
    pub path: String,
    pub global_functions: Vec<FunctionSymbol>,
    pub bound_functions: Vec<FunctionSymbol>,
    pub datablocks: Vec<DatablockDecl>,
}

impl FileEntities {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECT TABLES
// ═══════════════════════════════════════════════════════════════════════════════

/// The per-file view of the aggregated result model.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: String,
    pub global_functions: Vec<FunctionId>,
    pub bound_functions: BTreeMap<String, Vec<FunctionId>>,
    pub datablocks: Vec<DatablockId>,
}

impl FileReport {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }
}

/// Project-wide symbol tables. `globals` and `bound` map to the canonical
/// (first-seen) declaration for each key; `datablocks_by_name` keeps every
/// physical declaration.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub functions: Vec<FunctionSymbol>,
    pub datablocks: Vec<DatablockDecl>,
    pub globals: BTreeMap<String, FunctionId>,
    pub bound: BTreeMap<String, BTreeMap<String, FunctionId>>,
    pub datablocks_by_name: BTreeMap<String, Vec<DatablockId>>,
    pub files: Vec<FileReport>,
    /// Arena index of the first baseline-merged declaration, when a base
    /// layer was merged. Entries at or past it resolve as parents and
    /// reference targets but are not themselves analyzed.
    pub baseline_watermark: Option<u32>,
}

impl Project {
    pub fn function(&self, id: FunctionId) -> &FunctionSymbol {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionSymbol {
        &mut self.functions[id.0 as usize]
    }

    pub fn datablock(&self, id: DatablockId) -> &DatablockDecl {
        &self.datablocks[id.0 as usize]
    }

    pub fn datablock_mut(&mut self, id: DatablockId) -> &mut DatablockDecl {
        &mut self.datablocks[id.0 as usize]
    }

    pub fn push_function(&mut self, symbol: FunctionSymbol) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(symbol);
        id
    }

    pub fn push_datablock(&mut self, decl: DatablockDecl) -> DatablockId {
        let id = DatablockId(self.datablocks.len() as u32);
        self.datablocks.push(decl);
        id
    }

    /// Number of leading arena entries that belong to the current run.
    /// Everything past the watermark came from a baseline.
    pub fn analyzed_datablocks(&self) -> usize {
        self.baseline_watermark
            .map_or(self.datablocks.len(), |floor| floor as usize)
    }

    /// All physical declarations under a (lowercase) datablock name.
    pub fn declarations_of(&self, name: &str) -> &[DatablockId] {
        self.datablocks_by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
