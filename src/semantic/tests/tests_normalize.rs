#![allow(clippy::unwrap_used)]
use crate::error::ExtractError;
use crate::semantic::normalize::normalize;
use crate::semantic::symbol::{RelativeStarTarget, Symbol};
use crate::semantic::SymbolTable;

fn relative_star(targets: &[(&str, u32, &str)]) -> Symbol {
    Symbol::RelativeStarImport {
        imports: targets
            .iter()
            .map(|(target, level, module)| RelativeStarTarget::Raw {
                target: target.to_string(),
                level: *level,
                module: module.to_string(),
            })
            .collect(),
    }
}

/// The raw table of a small package:
///
/// ```text
/// pkg/__init__.py       from .version import get_versions ; from .core import *
/// pkg/version.py        def get_versions(): ...
/// pkg/core/__init__.py  from .numeric import *
/// pkg/core/numeric.py   def ones(): ... ; def absolute(): ...
/// ```
fn raw_package() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.insert("pkg.__init__", Symbol::package());
    table.insert(
        "pkg.__init__.get_versions",
        Symbol::relative_import_raw("version.get_versions", 1, "pkg.__init__"),
    );
    table.insert(
        "pkg.__init__.relative.*",
        relative_star(&[("core", 1, "pkg.__init__")]),
    );
    table.insert("pkg.version", Symbol::module());
    table.insert("pkg.version.get_versions", Symbol::function(4));
    table.insert("pkg.core.__init__", Symbol::package());
    table.insert(
        "pkg.core.__init__.relative.*",
        relative_star(&[("numeric", 1, "pkg.core.__init__")]),
    );
    table.insert("pkg.core.numeric", Symbol::module());
    table.insert("pkg.core.numeric.ones", Symbol::function(1));
    table.insert("pkg.core.numeric.absolute", Symbol::function(5));
    table
}

#[test]
fn test_marker_suffix_stripped_from_keys() {
    let (normalized, _) = normalize(raw_package()).unwrap();
    assert_eq!(normalized.get("pkg"), Some(&Symbol::package()));
    assert_eq!(normalized.get("pkg.core"), Some(&Symbol::package()));
    assert!(normalized.get("pkg.__init__").is_none());
    assert!(normalized.get("pkg.core.__init__").is_none());
}

#[test]
fn test_relative_import_dereferenced() {
    let (normalized, _) = normalize(raw_package()).unwrap();
    assert_eq!(
        normalized.get("pkg.get_versions"),
        Some(&Symbol::relative_import("pkg.version.get_versions"))
    );
}

#[test]
fn test_relative_star_targets_dereferenced() {
    let (normalized, _) = normalize(raw_package()).unwrap();
    assert_eq!(
        normalized.get("pkg.relative.*"),
        Some(&Symbol::RelativeStarImport {
            imports: vec![RelativeStarTarget::Resolved("pkg.core".to_string())],
        })
    );
}

#[test]
fn test_membership_registration() {
    let (_, index) = normalize(raw_package()).unwrap();
    let numeric: Vec<&str> = index
        .members("pkg.core.numeric")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(numeric, ["pkg.core.numeric.absolute", "pkg.core.numeric.ones"]);

    // Modules and packages register under their parent namespace, and the
    // relative-star marker is a member of the namespace it expands into.
    let core: Vec<&str> = index.members("pkg.core").iter().map(String::as_str).collect();
    assert!(core.contains(&"pkg.core.numeric"));
    assert!(core.contains(&"pkg.core.relative.*"));
    let root: Vec<&str> = index.members("pkg").iter().map(String::as_str).collect();
    assert!(root.contains(&"pkg.core"));
    assert!(root.contains(&"pkg.version"));
    // The collapsed package entry is not a member of its own namespace.
    assert!(!core.contains(&"pkg.core"));
}

#[test]
fn test_star_imports_reinserted_in_dependency_order() {
    let (normalized, _) = normalize(raw_package()).unwrap();
    let keys: Vec<&str> = normalized.keys().map(String::as_str).collect();
    let inner = keys.iter().position(|k| *k == "pkg.core.relative.*").unwrap();
    let outer = keys.iter().position(|k| *k == "pkg.relative.*").unwrap();
    assert!(
        inner < outer,
        "inner star-import must be normalized before the one that chains through it"
    );
}

#[test]
fn test_normalize_is_idempotent() {
    let (once, _) = normalize(raw_package()).unwrap();
    let (twice, _) = normalize(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_cycle_detected() {
    let mut table = SymbolTable::new();
    table.insert("cyc.__init__", Symbol::package());
    table.insert("cyc.a", Symbol::module());
    table.insert("cyc.b", Symbol::module());
    table.insert("cyc.a.relative.*", relative_star(&[("b", 1, "cyc.a")]));
    table.insert("cyc.b.relative.*", relative_star(&[("a", 1, "cyc.b")]));

    let error = normalize(table).unwrap_err();
    assert!(matches!(error, ExtractError::ImportCycle { .. }));
}

#[test]
fn test_self_cycle_detected() {
    let mut table = SymbolTable::new();
    table.insert("cyc.a", Symbol::module());
    table.insert("cyc.a.relative.*", relative_star(&[("a", 1, "cyc.a")]));

    let error = normalize(table).unwrap_err();
    assert!(matches!(error, ExtractError::ImportCycle { .. }));
}
