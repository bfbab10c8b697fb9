//! Error types for extraction and resolution.

use thiserror::Error;

/// Errors that can occur while extracting or resolving symbols.
///
/// `Parse` and `ImportCycle` are recovered where they arise: a file that
/// fails to parse contributes an empty per-file map, and a package whose
/// relative star-imports form a cycle resolves to an empty table. Neither
/// escapes a batch run.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A single module's source could not be parsed.
    #[error("failed to parse {module}: {message}")]
    Parse { module: String, message: String },

    /// The relative star-import dependency graph has a cycle.
    #[error("relative star-import cycle in package '{package}' involving '{member}'")]
    ImportCycle { package: String, member: String },

    /// IO error during file or directory access.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The extraction root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Symbol table serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExtractError {
    /// Create a parse error for a module.
    pub fn parse(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Create a cycle error for a package.
    pub fn cycle(package: impl Into<String>, member: impl Into<String>) -> Self {
        Self::ImportCycle {
            package: package.into(),
            member: member.into(),
        }
    }
}
