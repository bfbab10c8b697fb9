#![allow(clippy::unwrap_used)]
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

use crate::project::{extract_packages, PackageWalker};
use crate::semantic::symbol::{Symbol, VolumeEntry};

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A package with a two-hop relative star-import chain:
/// `pkg/__init__.py` re-exports `core`, whose `__init__.py` re-exports
/// `numeric`.
fn two_hop_fixture(root: &Path) {
    write(
        &root.join("__init__.py"),
        "from .version import get_versions\nfrom .core import *\n",
    );
    write(
        &root.join("version.py"),
        "import os\n\n\ndef get_versions():\n    return {'version': '1.0'}\n",
    );
    write(&root.join("core/__init__.py"), "from .numeric import *\n");
    write(
        &root.join("core/numeric.py"),
        "def ones(n):\n    return [1] * n\n\n\ndef absolute(x):\n    return abs(x)\n",
    );
}

#[test]
fn test_resolves_two_hop_star_chain() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("pkg");
    two_hop_fixture(&root);

    let table = PackageWalker::new(&root).unwrap().extract_symbols();

    assert_eq!(table.get("pkg"), Some(&Symbol::package()));
    assert_eq!(table.get("pkg.core"), Some(&Symbol::package()));
    assert_eq!(table.get("pkg.version"), Some(&Symbol::module()));
    assert_eq!(table.get("pkg.version.os"), Some(&Symbol::import("os")));
    assert_eq!(
        table.get("pkg.version.get_versions"),
        Some(&Symbol::Function {
            lineno: 4,
            volume: None,
        })
    );
    assert_eq!(
        table.get("pkg.core.numeric.ones"),
        Some(&Symbol::Function {
            lineno: 1,
            volume: None,
        })
    );
    assert_eq!(
        table.get("pkg.core.numeric.absolute"),
        Some(&Symbol::Function {
            lineno: 5,
            volume: Some(
                [("abs".to_string(), VolumeEntry::at(vec![6]))]
                    .into_iter()
                    .collect()
            ),
        })
    );

    // Single-hop expansion into core.
    assert_eq!(
        table.get("pkg.core.ones"),
        Some(&Symbol::relative_import("pkg.core.numeric.ones"))
    );
    // Two-hop chain flattened into the package root.
    assert_eq!(
        table.get("pkg.ones"),
        Some(&Symbol::relative_import("pkg.core.numeric.ones"))
    );
    assert_eq!(
        table.get("pkg.absolute"),
        Some(&Symbol::relative_import("pkg.core.numeric.absolute"))
    );
    // The star-import also shadows core's real submodule into the root.
    assert_eq!(
        table.get("pkg.numeric"),
        Some(&Symbol::relative_import("pkg.core.numeric"))
    );
    // Plain relative import dereferenced.
    assert_eq!(
        table.get("pkg.get_versions"),
        Some(&Symbol::relative_import("pkg.version.get_versions"))
    );
    // Scaffolding star-import keys are consumed by resolution.
    assert!(table.get("pkg.relative.*").is_none());
    assert!(table.get("pkg.core.relative.*").is_none());
}

#[test]
fn test_raw_symbols_are_unnormalized() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("pkg");
    two_hop_fixture(&root);

    let raw = PackageWalker::new(&root).unwrap().raw_symbols();
    assert_eq!(raw.get("pkg.__init__"), Some(&Symbol::package()));
    assert!(raw.contains("pkg.__init__.relative.*"));
    assert_eq!(
        raw.get("pkg.__init__.get_versions"),
        Some(&Symbol::relative_import_raw(
            "version.get_versions",
            1,
            "pkg.__init__"
        ))
    );
}

#[test]
fn test_parse_failure_yields_empty_file_map() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("pkg");
    write(&root.join("__init__.py"), "");
    write(&root.join("good.py"), "def f():\n    return 1\n");
    write(&root.join("bad.py"), "def broken(:\n");

    let table = PackageWalker::new(&root).unwrap().extract_symbols();
    assert_eq!(
        table.get("pkg.good.f"),
        Some(&Symbol::Function {
            lineno: 1,
            volume: None,
        })
    );
    // The unparsable module contributes nothing, not even its own entry.
    assert!(table.get("pkg.bad").is_none());
}

#[test]
fn test_star_import_cycle_yields_empty_table() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("cyc");
    write(&root.join("__init__.py"), "");
    write(&root.join("a.py"), "from .b import *\n");
    write(&root.join("b.py"), "from .a import *\n");

    let table = PackageWalker::new(&root).unwrap().extract_symbols();
    assert!(table.is_empty());
}

#[test]
fn test_plain_directory_does_not_recurse() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("scripts");
    write(&root.join("tool.py"), "def run():\n    return 0\n");
    write(&root.join("inner/helper.py"), "def h():\n    return 1\n");

    let walker = PackageWalker::new(&root).unwrap();
    assert!(!walker.is_package());
    let table = walker.extract_symbols();
    assert!(table.contains("scripts.tool.run"));
    assert!(!table.contains("scripts.inner.helper.h"));
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    assert!(PackageWalker::new(&missing).is_err());
}

#[test]
fn test_batch_extraction_isolates_failures() {
    let dir = tempdir().unwrap();
    let good = dir.path().join("pkg");
    two_hop_fixture(&good);
    let missing = dir.path().join("ghost");

    let results = extract_packages(&[good, PathBuf::from(&missing)]);
    assert_eq!(results.len(), 2);
    let (name, table) = &results[0];
    assert_eq!(name, "pkg");
    assert!(table.contains("pkg.ones"));
    let (_, empty) = &results[1];
    assert!(empty.is_empty());
}
