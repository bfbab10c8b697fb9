use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

use super::symbol::Symbol;

/// Mapping from fully-qualified dotted name to its symbol entry.
///
/// Keys are unique; insertion order is preserved and meaningful during
/// resolution (normalization reinserts relative star-imports in dependency
/// order, and expansion processes them by iterating the map).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol)
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.symbols.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.symbols.keys()
    }

    /// Union another table into this one. Collisions take the incoming
    /// entry; they are not expected between modules of one tree, since
    /// every key is qualified by its own module path.
    pub fn merge(&mut self, other: SymbolTable) {
        self.symbols.extend(other.symbols);
    }

    /// Append a reference to `symbol` at `line` into the volume of the
    /// entry named `surface`. Missing or volume-less surfaces are ignored.
    pub fn record_use(&mut self, surface: &str, symbol: &str, line: u32) {
        if let Some(entry) = self.symbols.get_mut(surface) {
            entry.record_use(symbol, line);
        }
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Symbol) -> bool) {
        self.symbols.retain(|name, symbol| keep(name, symbol));
    }

    /// Serialize to the wire format consumed by the symbol-table store.
    pub fn to_json(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Infer the source file path of every module and package entry
    /// (`pkg.sub` → `pkg/sub/__init__.py` or `pkg/sub.py`).
    pub fn module_file_names(&self) -> IndexMap<String, String> {
        self.symbols
            .iter()
            .filter_map(|(name, symbol)| {
                let path = name.replace('.', "/");
                match symbol {
                    Symbol::Package { .. } => Some((name.clone(), format!("{path}/__init__.py"))),
                    Symbol::Module { .. } => Some((name.clone(), format!("{path}.py"))),
                    _ => None,
                }
            })
            .collect()
    }
}

impl IntoIterator for SymbolTable {
    type Item = (String, Symbol);
    type IntoIter = indexmap::map::IntoIter<String, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.symbols.into_iter()
    }
}

impl FromIterator<(String, Symbol)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (String, Symbol)>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}
