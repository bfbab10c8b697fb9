//! # pysym-base
//!
//! Core library for Python package symbol extraction and cross-module
//! import resolution.
//!
//! Given a directory tree of Python source, the library produces a symbol
//! table mapping fully-qualified dotted names to the things they denote
//! (modules, packages, functions, classes, constants, import aliases),
//! with per-definition usage tracking and with relative imports and
//! star-imports resolved to concrete shadow entries.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project   → package walking, batch extraction
//!   ↓
//! semantic  → symbol model, module walker, normalizer, star expansion
//!   ↓
//! parser    → tree-sitter Python parsing
//!   ↓
//! base      → dotted-name utilities, builtin name set
//! ```

/// Foundation helpers: dotted-name manipulation, Python builtin names
pub mod base;

/// Crate-wide error type
pub mod error;

/// Python parsing via tree-sitter
pub mod parser;

/// Symbol model, single-module extraction, import resolution
pub mod semantic;

/// Package-tree walking and batch extraction
pub mod project;

pub use error::ExtractError;
pub use parser::{ParsedModule, PythonParser};
pub use project::{extract_packages, PackageWalker};
pub use semantic::{ModuleWalker, NamespaceIndex, Symbol, SymbolTable, TABLE_VERSION};
