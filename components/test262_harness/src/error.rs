//! Harness-level errors.
//!
//! These describe problems with the harness inputs (files, metadata,
//! includes, configuration) or the engine adapter, never a verdict about the
//! engine's conformance. The runner turns each one into an errored case.

use crate::config::ConfigError;
use crate::test_file::MetadataError;
use std::path::PathBuf;

/// Errors raised while loading or preparing a case.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A test file or include could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Metadata block missing or unparseable
    #[error("{path}: {source}")]
    Metadata {
        /// Test file path
        path: String,
        /// What went wrong
        #[source]
        source: MetadataError,
    },

    /// An `includes` entry names a helper the registry does not have
    #[error("unknown include `{name}`")]
    UnknownInclude {
        /// Helper file name
        name: String,
    },

    /// The engine adapter could not provide a realm
    #[error("engine error: {0}")]
    Engine(String),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
