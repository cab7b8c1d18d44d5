//! Helper-file registry.
//!
//! Helpers (`assert.js`, `propertyHelper.js`, ...) are read once and shared
//! read-only by every worker. A case asks the registry for its include list
//! and gets each helper exactly once, in load order.

use crate::error::{HarnessError, HarnessResult};
use crate::test_file::TestMetadata;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Helpers every non-raw case loads
pub const DEFAULT_INCLUDES: &[&str] = &["assert.js", "sta.js"];

/// Helper that provides `$DONE` for async cases
pub const ASYNC_INCLUDE: &str = "doneprintHandle.js";

/// One resolved helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// File name as written in metadata
    pub name: String,
    /// Helper source
    pub text: Arc<str>,
}

/// Read-only map of helper name to source text.
#[derive(Debug, Clone, Default)]
pub struct IncludeRegistry {
    entries: Arc<BTreeMap<String, Arc<str>>>,
}

impl IncludeRegistry {
    /// Registry with no helpers
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from in-memory entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), Arc::from(v.as_ref())))
            .collect();
        Self {
            entries: Arc::new(map),
        }
    }

    /// Register helpers the engine provides natively; their text is empty.
    pub fn native<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_entries(names.into_iter().map(|n| (n.into(), "")))
    }

    /// Load every `.js` file under `dir`, keyed by its path relative to `dir`
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> HarnessResult<Self> {
        let dir = dir.as_ref();
        let mut map = BTreeMap::new();
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "js") {
                continue;
            }
            let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let name = path
                .strip_prefix(dir)
                .unwrap_or(path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            map.insert(name, Arc::from(text));
        }
        tracing::debug!(dir = %dir.display(), helpers = map.len(), "loaded include registry");
        Ok(Self {
            entries: Arc::new(map),
        })
    }

    /// Find the suite's `harness/` directory above `start`
    pub fn discover<P: AsRef<Path>>(start: P) -> Option<PathBuf> {
        start
            .as_ref()
            .ancestors()
            .map(|dir| dir.join("harness"))
            .find(|candidate| candidate.join("assert.js").is_file())
    }

    /// Check whether a helper is registered
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Look up one helper
    pub fn get(&self, name: &str) -> Option<Arc<str>> {
        self.entries.get(name).cloned()
    }

    /// Number of registered helpers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names a case loads, in order, without duplicates
    pub fn include_names(metadata: &TestMetadata) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if !metadata.is_raw() {
            names.extend(DEFAULT_INCLUDES.iter().map(|s| s.to_string()));
            if metadata.is_async() {
                names.push(ASYNC_INCLUDE.to_string());
            }
        }
        names.extend(metadata.includes.iter().cloned());

        let mut seen = HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
        names
    }

    /// Resolve a case's helpers
    pub fn resolve(&self, metadata: &TestMetadata) -> HarnessResult<Vec<Include>> {
        Self::include_names(metadata)
            .into_iter()
            .map(|name| match self.get(&name) {
                Some(text) => Ok(Include { name, text }),
                None => Err(HarnessError::UnknownInclude { name }),
            })
            .collect()
    }
}
