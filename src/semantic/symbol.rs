use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Schema version of produced symbol tables.
///
/// Increment when consumers must rebuild stored tables (e.g. a new entry
/// kind or payload field). Must remain an integer string.
pub const TABLE_VERSION: &str = "2";

/// External symbols referenced within one definition's body, with the
/// source lines of each reference.
pub type Volume = IndexMap<String, VolumeEntry>;

/// Line numbers at which one symbol is referenced from one definition.
///
/// Lines accumulate; a second reference to the same symbol appends to the
/// existing entry rather than creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VolumeEntry {
    #[serde(rename = "line number")]
    pub lines: Vec<u32>,
}

impl VolumeEntry {
    pub fn at(lines: impl Into<Vec<u32>>) -> Self {
        Self { lines: lines.into() }
    }
}

/// One target of a relative star-import.
///
/// Recorded raw at extraction time (the importing module is not yet known
/// to be a package or a plain module); normalization dereferences each
/// record to the absolute namespace it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelativeStarTarget {
    Raw {
        #[serde(rename = "shadows")]
        target: String,
        level: u32,
        module: String,
    },
    Resolved(String),
}

/// A named element of a Python package: one payload shape per entry kind.
///
/// Serializes as `{"type": <kind-string>, "data": {...}}`, the wire format
/// shared with the symbol-table store and the compiled-extension extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Symbol {
    /// A plain source module.
    Module {
        #[serde(
            rename = "symbols_in_volume",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        volume: Option<Volume>,
    },
    /// A package (a directory with a marker file, collapsed onto its name).
    Package {
        #[serde(
            rename = "symbols_in_volume",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        volume: Option<Volume>,
    },
    /// A local name aliasing an absolute dotted name.
    Import { shadows: String },
    /// A local name aliasing a target reached through ancestor packages.
    ///
    /// `level`/`module` are present only before normalization; afterwards
    /// `shadows` is absolute and stands alone.
    RelativeImport {
        shadows: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        module: Option<String>,
    },
    Function {
        lineno: u32,
        #[serde(
            rename = "symbols_in_volume",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        volume: Option<Volume>,
    },
    Class {
        lineno: u32,
        #[serde(
            rename = "symbols_in_volume",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        volume: Option<Volume>,
    },
    /// A module-scope single-name assignment.
    Constant { lineno: u32 },
    /// External namespaces star-imported by one module (`from x import *`).
    StarImport { imports: BTreeSet<String> },
    /// Relative star-imports of one module (`from .x import *`).
    RelativeStarImport { imports: Vec<RelativeStarTarget> },
}

impl Symbol {
    pub fn module() -> Self {
        Symbol::Module { volume: None }
    }

    pub fn package() -> Self {
        Symbol::Package { volume: None }
    }

    pub fn function(lineno: u32) -> Self {
        Symbol::Function {
            lineno,
            volume: None,
        }
    }

    pub fn class(lineno: u32) -> Self {
        Symbol::Class {
            lineno,
            volume: None,
        }
    }

    pub fn import(shadows: impl Into<String>) -> Self {
        Symbol::Import {
            shadows: shadows.into(),
        }
    }

    /// A relative import as recorded at extraction time.
    pub fn relative_import_raw(
        target: impl Into<String>,
        level: u32,
        module: impl Into<String>,
    ) -> Self {
        Symbol::RelativeImport {
            shadows: target.into(),
            level: Some(level),
            module: Some(module.into()),
        }
    }

    /// A relative import with its shadow already dereferenced.
    pub fn relative_import(shadows: impl Into<String>) -> Self {
        Symbol::RelativeImport {
            shadows: shadows.into(),
            level: None,
            module: None,
        }
    }

    /// The wire-format kind string for this entry.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Module { .. } => "module",
            Symbol::Package { .. } => "package",
            Symbol::Import { .. } => "import",
            Symbol::RelativeImport { .. } => "relative-import",
            Symbol::Function { .. } => "function",
            Symbol::Class { .. } => "class",
            Symbol::Constant { .. } => "constant",
            Symbol::StarImport { .. } => "star-import",
            Symbol::RelativeStarImport { .. } => "relative-star-import",
        }
    }

    /// Definition line, for the kinds that have one.
    pub fn lineno(&self) -> Option<u32> {
        match self {
            Symbol::Function { lineno, .. }
            | Symbol::Class { lineno, .. }
            | Symbol::Constant { lineno } => Some(*lineno),
            _ => None,
        }
    }

    /// The absolute name this entry aliases, for import kinds.
    pub fn shadows(&self) -> Option<&str> {
        match self {
            Symbol::Import { shadows } | Symbol::RelativeImport { shadows, .. } => Some(shadows),
            _ => None,
        }
    }

    pub fn volume(&self) -> Option<&Volume> {
        match self {
            Symbol::Module { volume }
            | Symbol::Package { volume }
            | Symbol::Function { volume, .. }
            | Symbol::Class { volume, .. } => volume.as_ref(),
            _ => None,
        }
    }

    /// Append a referenced symbol to this entry's volume.
    ///
    /// Only module, package, function and class entries carry volumes;
    /// recording against any other kind is a no-op.
    pub fn record_use(&mut self, symbol: &str, line: u32) {
        let slot = match self {
            Symbol::Module { volume }
            | Symbol::Package { volume }
            | Symbol::Function { volume, .. }
            | Symbol::Class { volume, .. } => volume,
            _ => return,
        };
        slot.get_or_insert_with(Volume::new)
            .entry(symbol.to_string())
            .or_default()
            .lines
            .push(line);
    }

    pub fn volume_mut(&mut self) -> Option<&mut Volume> {
        match self {
            Symbol::Module { volume }
            | Symbol::Package { volume }
            | Symbol::Function { volume, .. }
            | Symbol::Class { volume, .. } => volume.as_mut(),
            _ => None,
        }
    }

    pub fn is_module_or_package(&self) -> bool {
        matches!(self, Symbol::Module { .. } | Symbol::Package { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Symbol::Constant { .. })
    }

    pub fn is_relative_star_import(&self) -> bool {
        matches!(self, Symbol::RelativeStarImport { .. })
    }
}
