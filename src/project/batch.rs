use std::path::PathBuf;

use rayon::prelude::*;
use tracing::warn;

use crate::semantic::SymbolTable;

use super::package_walker::PackageWalker;

/// Extract many independent package trees in parallel.
///
/// Independent packages share no state, so extraction is embarrassingly
/// parallel at package granularity; resolution within each tree stays
/// sequential. A directory that cannot be walked yields an empty table —
/// failures never cross package boundaries.
pub fn extract_packages(directories: &[PathBuf]) -> Vec<(String, SymbolTable)> {
    directories
        .par_iter()
        .map(|directory| match PackageWalker::new(directory) {
            Ok(walker) => {
                let name = walker.module_path().to_string();
                (name, walker.extract_symbols())
            }
            Err(error) => {
                warn!(directory = %directory.display(), %error, "skipping package");
                let name = directory
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or_default()
                    .to_string();
                (name, SymbolTable::new())
            }
        })
        .collect()
}
