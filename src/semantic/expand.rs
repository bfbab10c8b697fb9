use tracing::trace;

use crate::base::dotted::{dereference_relative, relative_star_namespace};

use super::namespaces::NamespaceIndex;
use super::symbol::{RelativeStarTarget, Symbol};
use super::symbol_table::SymbolTable;

/// Expand every relative star-import into concrete shadow entries.
///
/// Expects a normalized table: star entries sit at the tail of the map in
/// dependency order, so a chain `from .core import *` → `from .numeric
/// import *` expands the inner hop first. Member payloads are read from an
/// immutable pre-expansion snapshot; additions go to an accumulator owned
/// by the recursion, and every shadow-adding case is add-if-absent, so
/// expansion never rewrites an existing entry. The scaffolding
/// relative-star keys are consumed and dropped from the returned table;
/// external `.*` entries stay, carrying the unresolved external
/// dependencies downstream consumers match against.
pub fn expand_star_imports(table: SymbolTable, index: &NamespaceIndex) -> SymbolTable {
    let star_imports: Vec<(String, Vec<String>)> = table
        .iter()
        .filter_map(|(key, symbol)| match symbol {
            Symbol::RelativeStarImport { imports } => {
                Some((key.clone(), resolved_targets(imports)))
            }
            _ => None,
        })
        .collect();
    if star_imports.is_empty() {
        return table;
    }

    let source = table.clone();
    let mut accumulator = table;
    for (key, targets) in &star_imports {
        let importing_namespace = relative_star_namespace(key);
        accumulator = expand(&source, index, targets, importing_namespace, accumulator);
    }
    accumulator.retain(|_, symbol| !symbol.is_relative_star_import());
    accumulator
}

fn expand(
    source: &SymbolTable,
    index: &NamespaceIndex,
    targets: &[String],
    importing_namespace: &str,
    mut accumulator: SymbolTable,
) -> SymbolTable {
    for target in targets {
        for member in index.members(target) {
            let Some(suffix) = member.strip_prefix(target.as_str()) else {
                continue;
            };
            let new_key = format!("{importing_namespace}{suffix}");
            let Some(entry) = source.get(member) else {
                continue;
            };
            trace!(%member, %new_key, kind = entry.kind_name(), "expanding star-import member");
            match entry {
                // Chain through to the member's own ultimate target. An
                // already-present key is a benign duplicate or circular
                // re-export: first writer wins.
                Symbol::RelativeImport { shadows, .. } => {
                    if !accumulator.contains(&new_key) {
                        accumulator.insert(new_key, Symbol::relative_import(shadows.clone()));
                    }
                }
                // A multi-hop re-export chain flattens into the original
                // importing namespace.
                Symbol::RelativeStarImport { imports } => {
                    let nested = resolved_targets(imports);
                    accumulator = expand(source, index, &nested, importing_namespace, accumulator);
                }
                // An external dependency propagates through the re-export.
                Symbol::StarImport { imports } => {
                    if accumulator.contains(&new_key) {
                        if let Some(Symbol::StarImport { imports: existing }) =
                            accumulator.get_mut(&new_key)
                        {
                            existing.extend(imports.iter().cloned());
                        }
                    } else {
                        let entry = Symbol::StarImport {
                            imports: imports.clone(),
                        };
                        accumulator.insert(new_key, entry);
                    }
                }
                // A real submodule of that name always takes precedence
                // over a star-import shadow.
                Symbol::Module { .. } | Symbol::Package { .. } => {
                    if !accumulator.contains(&new_key) {
                        accumulator.insert(new_key, Symbol::relative_import(member.clone()));
                    }
                }
                _ => {
                    if !accumulator.contains(&new_key) {
                        accumulator.insert(new_key, Symbol::relative_import(member.clone()));
                    }
                }
            }
        }
    }
    accumulator
}

fn resolved_targets(imports: &[RelativeStarTarget]) -> Vec<String> {
    imports
        .iter()
        .map(|target| match target {
            RelativeStarTarget::Resolved(namespace) => namespace.clone(),
            RelativeStarTarget::Raw {
                target,
                level,
                module,
            } => dereference_relative(module, *level, target),
        })
        .collect()
}
