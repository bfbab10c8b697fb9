#![allow(clippy::unwrap_used)]
//! The serialized table shape shared with the symbol-table store and the
//! compiled-extension extractor.

use pysym::semantic::{extract_source, SymbolTable, TABLE_VERSION};

#[test]
fn test_table_version_is_integer_string() {
    assert!(TABLE_VERSION.parse::<u32>().is_ok());
}

#[test]
fn test_extracted_table_serializes_to_wire_shape() {
    let source = "from abc import xyz as l\n\ndef f():\n    return l.i\n";
    let table = extract_source(source, "mm").unwrap();
    let value: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();

    assert_eq!(value["mm"]["type"], "module");
    assert_eq!(value["mm.l"]["type"], "import");
    assert_eq!(value["mm.l"]["data"]["shadows"], "abc.xyz");
    assert_eq!(value["mm.f"]["type"], "function");
    assert_eq!(value["mm.f"]["data"]["lineno"], 3);
    assert_eq!(
        value["mm.f"]["data"]["symbols_in_volume"]["abc.xyz.i"]["line number"],
        serde_json::json!([4])
    );
}

#[test]
fn test_round_trip_preserves_extracted_table() {
    let source = "import numpy as np\nfrom .core import *\nfrom json import *\n\nz = np.ones(5)\n";
    let table = extract_source(source, "pkg.__init__").unwrap();
    let restored = SymbolTable::from_json(&table.to_json().unwrap()).unwrap();
    assert_eq!(restored, table);
}

#[test]
fn test_foreign_tables_merge_transparently() {
    // A compiled-extension extractor hands back entries in the same
    // schema; unioning them with source-derived entries is transparent.
    let foreign = r#"{
        "pkg._native": {"type": "module", "data": {}},
        "pkg._native.fast_ones": {"type": "function", "data": {"lineno": 0}}
    }"#;
    let mut table = extract_source("def slow_ones():\n    return [1]\n", "pkg.mod").unwrap();
    table.merge(SymbolTable::from_json(foreign).unwrap());

    assert!(table.contains("pkg.mod.slow_ones"));
    assert!(table.contains("pkg._native.fast_ones"));
}
