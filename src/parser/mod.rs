//! Python parsing.
//!
//! Thin wrapper around tree-sitter with the Python grammar. The rest of
//! the crate consumes the concrete syntax tree directly; there is no
//! intermediate AST.

mod python;

pub use python::{node_text, ParsedModule, PythonParser};
