use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::base::dotted::{
    dereference_relative, namespace_of, relative_star_key, relative_star_namespace, strip_marker,
};
use crate::error::ExtractError;

use super::namespaces::NamespaceIndex;
use super::symbol::{RelativeStarTarget, Symbol};
use super::symbol_table::SymbolTable;

/// Normalize a raw, merged package table.
///
/// Package marker suffixes are stripped from keys, relative imports are
/// dereferenced against the importing module recorded at extraction time,
/// and every entry is registered in the namespace membership index under
/// its parent namespace. Relative star-imports are reinserted last, in
/// topological dependency order, so a star-import that chains through
/// another sees its dependency already normalized.
///
/// A dependency cycle among relative star-imports aborts normalization
/// for the whole package; the caller degrades to an empty table rather
/// than producing partial, silently wrong data.
///
/// Applying `normalize` to an already-normalized table is a no-op.
pub fn normalize(table: SymbolTable) -> Result<(SymbolTable, NamespaceIndex), ExtractError> {
    let mut entries: Vec<(String, Symbol)> = table.into_iter().collect();
    // (kind, key) order keeps resolution independent of merge order.
    entries.sort_by(|a, b| {
        (a.1.kind_name(), a.0.as_str()).cmp(&(b.1.kind_name(), b.0.as_str()))
    });

    let mut normalized = SymbolTable::new();
    let mut index = NamespaceIndex::new();
    let mut star_entries: Vec<(String, Symbol)> = Vec::new();
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut nodes: FxHashMap<String, NodeIndex> = FxHashMap::default();

    for (key, symbol) in entries {
        let new_key = strip_marker(&key);
        match symbol {
            Symbol::RelativeImport {
                shadows,
                level,
                module,
            } => {
                let shadows = match (level, module) {
                    (Some(level), Some(module)) => dereference_relative(&module, level, &shadows),
                    _ => shadows,
                };
                trace!(key = %new_key, %shadows, "dereferenced relative import");
                index.register(namespace_of(&new_key), &new_key);
                normalized.insert(new_key, Symbol::relative_import(shadows));
            }
            Symbol::RelativeStarImport { imports } => {
                let resolved: Vec<String> = imports
                    .iter()
                    .map(|target| match target {
                        RelativeStarTarget::Raw {
                            target,
                            level,
                            module,
                        } => dereference_relative(module, *level, target),
                        RelativeStarTarget::Resolved(namespace) => namespace.clone(),
                    })
                    .collect();
                let node = intern_node(&mut graph, &mut nodes, &new_key);
                for namespace in &resolved {
                    let dep = intern_node(&mut graph, &mut nodes, &relative_star_key(namespace));
                    graph.add_edge(dep, node, ());
                }
                index.register(relative_star_namespace(&new_key), &new_key);
                let imports = resolved.into_iter().map(RelativeStarTarget::Resolved).collect();
                star_entries.push((new_key, Symbol::RelativeStarImport { imports }));
            }
            other => {
                index.register(namespace_of(&new_key), &new_key);
                normalized.insert(new_key, other);
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        let member = graph[cycle.node_id()].clone();
        let package = member.split('.').next().unwrap_or(&member).to_string();
        ExtractError::cycle(package, member)
    })?;

    let mut star_entries: FxHashMap<String, Symbol> = star_entries.into_iter().collect();
    for node in order {
        let key = &graph[node];
        if let Some(entry) = star_entries.remove(key) {
            normalized.insert(key.clone(), entry);
        }
    }

    Ok((normalized, index))
}

fn intern_node(
    graph: &mut DiGraph<String, ()>,
    nodes: &mut FxHashMap<String, NodeIndex>,
    key: &str,
) -> NodeIndex {
    if let Some(node) = nodes.get(key) {
        return *node;
    }
    let node = graph.add_node(key.to_string());
    nodes.insert(key.to_string(), node);
    node
}
