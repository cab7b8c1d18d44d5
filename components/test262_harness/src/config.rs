//! Runner configuration.
//!
//! Loaded from a YAML file, then overridden from the command line. Every
//! key has a default, and unknown keys are rejected so a typo does not
//! silently fall back to a default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range
    #[error("invalid config value for `{key}`: {reason}")]
    Invalid {
        /// Offending key
        key: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// How results are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Failures and the summary
    #[default]
    Summary,
    /// One line per case plus the summary with every failure
    Verbose,
    /// The JSON report on stdout
    Json,
}

/// Feature gating
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeatureConfig {
    /// When set, only these features are runnable
    pub supported: Option<BTreeSet<String>>,
    /// Features that are never runnable
    pub unsupported: BTreeSet<String>,
}

/// External engine command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Executable to run (e.g. `d8`, `js`, `node`)
    pub command: String,
    /// Arguments placed before the script path
    pub args: Vec<String>,
    /// Extra arguments for module-goal cases
    pub module_args: Vec<String>,
    /// Arguments that make the engine parse without evaluating, if it has any
    pub parse_only_args: Option<Vec<String>>,
}

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory case ids are relative to
    pub test_root: Option<PathBuf>,
    /// Directory holding helper files (`assert.js`, `propertyHelper.js`, ...)
    pub include_dir: Option<PathBuf>,
    /// Per-case timeout in milliseconds
    pub timeout_ms: u64,
    /// Feature gating
    pub features: FeatureConfig,
    /// Run unflagged scripts in both sloppy and strict mode
    pub strict_variants: bool,
    /// Treat a file without a metadata block as an error
    pub require_metadata: bool,
    /// Warn when a synchronous case never calls `reportCompare`
    pub expect_report_compare: bool,
    /// Whether the host agent may block (`Atomics.wait`)
    pub can_block: bool,
    /// Worker threads
    pub jobs: usize,
    /// Only run cases whose id contains this string
    pub filter: Option<String>,
    /// Stop after this many files
    pub limit: Option<usize>,
    /// External engine, for the process adapter
    pub engine: Option<EngineConfig>,
    /// Output format
    pub output: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_root: None,
            include_dir: None,
            timeout_ms: 10_000,
            features: FeatureConfig::default(),
            strict_variants: true,
            require_metadata: true,
            expect_report_compare: true,
            can_block: true,
            jobs: 1,
            filter: None,
            limit: None,
            engine: None,
            output: OutputFormat::Summary,
        }
    }
}

impl HarnessConfig {
    /// Load and validate a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse and validate YAML config text
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.jobs == 0 {
            return Err(ConfigError::Invalid {
                key: "jobs",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(engine) = &self.engine {
            if engine.command.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key: "engine.command",
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Per-case timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check whether a feature may run
    pub fn is_feature_supported(&self, feature: &str) -> bool {
        if self.features.unsupported.contains(feature) {
            return false;
        }
        match &self.features.supported {
            Some(supported) => supported.contains(feature),
            None => true,
        }
    }

    /// Get the features in `required` that may not run
    pub fn unsupported_features(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|f| !self.is_feature_supported(f))
            .cloned()
            .collect()
    }
}
