//! Extraction Stage
//!
//! Pattern-based lexical recovery of functions and datablocks from one
//! script file. This is deliberately not a grammar-correct parser: a
//! single combined alternation is scanned over the file text left to
//! right, and each hit is branched on its leading keyword, exactly like
//! the constructs appear in source order. Extraction is a pure function
//! of the file contents and shares no state, so the discovery stage may
//! fan it out across worker threads freely.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::model::{DatablockDecl, FileEntities, FunctionSymbol, PropertyValue, SourceLocation};
use crate::ScanError;

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERNS
// ═══════════════════════════════════════════════════════════════════════════════

lazy_static! {
    /// Function headers and whole datablock bodies in one alternation.
    /// The datablock arm runs lazily to a `};` at the start of a line; the
    /// header may put its opening brace on the following line.
    static ref CONSTRUCT_RE: Regex = Regex::new(
        r"(?ms)^[ \t]*function\s+[A-Za-z_][A-Za-z0-9_]*(?:::[A-Za-z_][A-Za-z0-9_]*)?\s*\([^)]*\)|^[ \t]*datablock\s+[A-Za-z_][A-Za-z0-9_]*\s*\(\s*[^)\s]+\s*\)[^\n{]*\s*\{.*?^[ \t]*\};"
    )
    .unwrap();

    /// `key = value;` assignments inside a datablock body, one per line.
    static ref KEY_VALUE_RE: Regex =
        Regex::new(r"(?m)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+);").unwrap();

    /// Trailing line comments that sometimes ride on datablock headers.
    static ref LINE_COMMENT_RE: Regex = Regex::new(r"//.*").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Read and extract one file. An unreadable file is a per-file failure;
/// the caller reports it and carries on with the rest of the project.
pub fn extract_file(path: &Path) -> Result<FileEntities, ScanError> {
    let source = fs::read_to_string(path).map_err(|e| ScanError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(extract_source(&source, &path.to_string_lossy()))
}

/// Extract every recognizable construct from `source`. Malformed
/// fragments are skipped without producing an entity.
pub fn extract_source(source: &str, path: &str) -> FileEntities {
    let mut file = FileEntities::new(path);

    for construct in CONSTRUCT_RE.find_iter(source) {
        let line = source[..construct.start()].matches('\n').count() as u32 + 1;
        let text = construct.as_str().trim();

        // `::` cannot legally occur inside just the header otherwise, so
        // its presence is what separates bound functions from globals.
        if text.starts_with("function") {
            match parse_function(text, path, line) {
                Some(symbol) if symbol.owner.is_some() => file.bound_functions.push(symbol),
                Some(symbol) => file.global_functions.push(symbol),
                None => tracing::debug!(path, line, "skipped malformed function construct"),
            }
        } else {
            match parse_datablock(text, path, line) {
                Some(decl) => file.datablocks.push(decl),
                None => tracing::debug!(path, line, "skipped malformed datablock construct"),
            }
        }
    }

    file
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNCTION CONSTRUCTS
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_function(text: &str, path: &str, line: u32) -> Option<FunctionSymbol> {
    let header = text.strip_prefix("function")?.trim_start();
    let open = header.find('(')?;

    let callee = header[..open].trim();
    let (owner, name) = match callee.split_once("::") {
        Some((owner, name)) => (Some(owner.trim().to_lowercase()), name.trim().to_lowercase()),
        None => (None, callee.to_lowercase()),
    };
    if name.is_empty() {
        return None;
    }

    // Every parameter is kept, in declaration order. Parameter tokens stay
    // in their original case.
    let list = header[open + 1..].trim_end_matches(')');
    let parameters: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Some(FunctionSymbol::new(
        name,
        owner,
        parameters,
        SourceLocation::new(path, line),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DATABLOCK CONSTRUCTS
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_datablock(text: &str, path: &str, line: u32) -> Option<DatablockDecl> {
    let brace = text.find('{')?;

    // Rip off commenting that we sometimes get in header lines before
    // looking for the parent clause.
    let header = LINE_COMMENT_RE.replace_all(&text[..brace], "");
    let header = header.trim();
    let header = header.strip_prefix("datablock")?;

    let open = header.find('(')?;
    let close = header.find(')')?;
    if close < open {
        return None;
    }

    let block_type = header[..open].trim().to_lowercase();
    let name = header[open + 1..close].trim().to_lowercase();
    if block_type.is_empty() || name.is_empty() {
        return None;
    }

    // `: parent[, parent...]`; a single parent is just a one-element list.
    let tail = &header[close + 1..];
    let parents: Vec<String> = match tail.find(':') {
        Some(colon) => tail[colon + 1..]
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect(),
        None => Vec::new(),
    };

    let mut properties = BTreeMap::new();
    for captures in KEY_VALUE_RE.captures_iter(&text[brace..]) {
        let key = captures[1].to_lowercase();
        let raw = captures[2].trim();
        properties.insert(key, PropertyValue::classify(raw));
    }

    Some(DatablockDecl::new(
        name,
        block_type,
        parents,
        properties,
        SourceLocation::new(path, line),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_function_keeps_every_parameter() {
        let file = extract_source("function Foo(%a,%b) {}\n", "demo.cs");
        assert_eq!(file.global_functions.len(), 1);
        let foo = &file.global_functions[0];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.owner, None);
        assert_eq!(foo.parameters, vec!["%a", "%b"]);
        assert_eq!(foo.location.line, 1);
    }

    #[test]
    fn test_empty_parameter_list() {
        let file = extract_source("function tick()\n{\n}\n", "demo.cs");
        assert_eq!(file.global_functions.len(), 1);
        assert!(file.global_functions[0].parameters.is_empty());
    }

    #[test]
    fn test_bound_function() {
        let file = extract_source("function Alpha::update(%this, %delta) {}\n", "demo.cs");
        assert!(file.global_functions.is_empty());
        assert_eq!(file.bound_functions.len(), 1);
        let update = &file.bound_functions[0];
        assert_eq!(update.owner.as_deref(), Some("alpha"));
        assert_eq!(update.name, "update");
        assert_eq!(update.parameters, vec!["%this", "%delta"]);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let source = "// header\n\nfunction later() {}\n";
        let file = extract_source(source, "demo.cs");
        assert_eq!(file.global_functions[0].location.line, 3);
    }

    #[test]
    fn test_datablock_basic() {
        let source = "datablock ItemData(Foo)\n{\n   pickupRadius = 2;\n};\n";
        let file = extract_source(source, "demo.cs");
        assert_eq!(file.datablocks.len(), 1);
        let foo = &file.datablocks[0];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.block_type, "itemdata");
        assert!(foo.parents.is_empty());
        assert_eq!(
            foo.properties.get("pickupradius"),
            Some(&PropertyValue::Number(2.0))
        );
    }

    #[test]
    fn test_datablock_parent_list() {
        let source = "datablock ItemData(Ammo) : BaseAmmo, SharedItem\n{\n};\n";
        let file = extract_source(source, "demo.cs");
        assert_eq!(file.datablocks[0].parents, vec!["baseammo", "shareditem"]);
    }

    #[test]
    fn test_datablock_header_comment_stripped() {
        let source = "datablock ItemData(Flag) : BaseItem // capture flag\n{\n};\n";
        let file = extract_source(source, "demo.cs");
        assert_eq!(file.datablocks[0].parents, vec!["baseitem"]);
    }

    #[test]
    fn test_datablock_property_classification() {
        let source = concat!(
            "datablock AudioProfile(Shot)\n{\n",
            "   description = $AudioGui;\n",
            "   fileName = \"shot.wav\";\n",
            "   volume = 0.8;\n",
            "};\n"
        );
        let file = extract_source(source, "demo.cs");
        let shot = &file.datablocks[0];
        assert_eq!(
            shot.properties.get("description"),
            Some(&PropertyValue::GlobalReference("AudioGui".to_string()))
        );
        assert_eq!(
            shot.properties.get("filename"),
            Some(&PropertyValue::Text("shot.wav".to_string()))
        );
        assert_eq!(shot.properties.get("volume"), Some(&PropertyValue::Number(0.8)));
    }

    #[test]
    fn test_malformed_assignment_lines_skipped() {
        let source = "datablock ItemData(Odd)\n{\n   = broken;\n   radius = 3;\n};\n";
        let file = extract_source(source, "demo.cs");
        let odd = &file.datablocks[0];
        assert_eq!(odd.properties.len(), 1);
        assert!(odd.properties.contains_key("radius"));
    }

    #[test]
    fn test_constructs_in_source_order() {
        let source = concat!(
            "function first() {}\n",
            "datablock ItemData(Mid)\n{\n};\n",
            "function Beta::last(%a) {}\n"
        );
        let file = extract_source(source, "demo.cs");
        assert_eq!(file.global_functions.len(), 1);
        assert_eq!(file.bound_functions.len(), 1);
        assert_eq!(file.datablocks.len(), 1);
        assert!(file.global_functions[0].location.line < file.datablocks[0].location.line);
        assert!(file.datablocks[0].location.line < file.bound_functions[0].location.line);
    }

    #[test]
    fn test_function_bodies_do_not_leak_properties() {
        // An assignment inside a function body is not a datablock property.
        let source = "function setup() {\n   %x = 1;\n}\ndatablock ItemData(Real)\n{\n};\n";
        let file = extract_source(source, "demo.cs");
        assert!(file.datablocks[0].properties.is_empty());
    }
}
