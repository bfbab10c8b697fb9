use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::base::dotted::PACKAGE_MARKER;
use crate::error::ExtractError;
use crate::parser::PythonParser;
use crate::semantic::{expand_star_imports, normalize, ModuleWalker, SymbolTable};

/// Walks one package directory tree and produces its symbol table.
///
/// Every direct `*.py` file is extracted and the per-file maps are
/// unioned; if the directory is a regular package (it contains
/// `__init__.py`), subdirectories are walked with this directory's module
/// path as the new parent. Only regular packages are handled — namespace
/// packages (PEP 420) are not.
pub struct PackageWalker {
    directory: PathBuf,
    module_path: String,
    is_package: bool,
}

impl PackageWalker {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        Self::with_parent(directory.into(), None)
    }

    fn with_parent(directory: PathBuf, parent: Option<&str>) -> Result<Self, ExtractError> {
        if !directory.is_dir() {
            return Err(ExtractError::NotADirectory(
                directory.display().to_string(),
            ));
        }
        let name = directory
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ExtractError::NotADirectory(directory.display().to_string()))?;
        let module_path = match parent {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        let is_package = directory.join(PACKAGE_MARKER).is_file();
        Ok(Self {
            module_path,
            is_package,
            directory,
        })
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    /// Extract and resolve the tree's symbols: merge per-file maps,
    /// normalize relative imports, expand star-imports.
    ///
    /// A relative star-import cycle aborts resolution for this package and
    /// yields an empty table; no partial result is produced.
    pub fn extract_symbols(&self) -> SymbolTable {
        let raw = self.raw_symbols();
        match normalize(raw) {
            Ok((normalized, index)) => expand_star_imports(normalized, &index),
            Err(error) => {
                warn!(package = %self.module_path, %error, "aborting resolution for package");
                SymbolTable::new()
            }
        }
    }

    /// The merged, unresolved symbol table of the whole tree.
    pub fn raw_symbols(&self) -> SymbolTable {
        let mut parser = PythonParser::new();
        let mut merged = SymbolTable::new();
        self.collect_into(&mut parser, &mut merged);
        merged
    }

    fn collect_into(&self, parser: &mut PythonParser, merged: &mut SymbolTable) {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(directory = %self.directory.display(), %error, "failed to read directory");
                return;
            }
        };
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .collect();
        paths.sort();

        for path in &paths {
            if path.is_file() && path.extension().is_some_and(|ext| ext == "py") {
                merged.merge(self.parse_file(parser, path));
            }
        }
        if self.is_package {
            for path in &paths {
                if !path.is_dir() {
                    continue;
                }
                match Self::with_parent(path.clone(), Some(&self.module_path)) {
                    Ok(sub_walker) => sub_walker.collect_into(parser, merged),
                    Err(error) => {
                        warn!(directory = %path.display(), %error, "skipping subdirectory");
                    }
                }
            }
        }
    }

    /// Extract one file. Read and parse failures degrade to an empty
    /// per-file map so a bad module never aborts the batch.
    fn parse_file(&self, parser: &mut PythonParser, path: &Path) -> SymbolTable {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return SymbolTable::new();
        };
        let module_name = format!("{}.{}", self.module_path, stem);
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) => {
                warn!(module = %module_name, %error, "failed to read module");
                return SymbolTable::new();
            }
        };
        match parser.parse(&source, &module_name) {
            Ok(parsed) => {
                let is_marker = path
                    .file_name()
                    .is_some_and(|name| name == PACKAGE_MARKER);
                let mut walker = if is_marker {
                    ModuleWalker::package(&module_name, &source)
                } else {
                    ModuleWalker::new(&module_name, &source)
                };
                walker.walk(&parsed);
                debug!(module = %module_name, "extracted module");
                walker.finish()
            }
            Err(error) => {
                warn!(%error, "failed to parse module");
                SymbolTable::new()
            }
        }
    }
}
