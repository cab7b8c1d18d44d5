use crate::error::{HarnessError, HarnessResult};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn frontmatter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)/\*---\r?\n(.*?)\r?\n?---\*/").expect("frontmatter pattern is valid")
    })
}

fn frontmatter_with_trailer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)/\*---\r?\n.*?\r?\n?---\*/\s*").expect("frontmatter pattern is valid")
    })
}

fn reftest_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*//\s*\|reftest\|(.*)$").expect("reftest pattern is valid"))
}

/// Phase in which a negative test expects its error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Early error raised while parsing; the body must never run
    Parse,
    /// Module linking error
    Resolution,
    /// Error thrown while evaluating
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parse => write!(f, "parse"),
            Phase::Resolution => write!(f, "resolution"),
            Phase::Runtime => write!(f, "runtime"),
        }
    }
}

/// Test262 negative test expectation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NegativeExpectation {
    /// Phase where the error is expected
    pub phase: Phase,
    /// Constructor name of the expected error (e.g., "SyntaxError")
    #[serde(rename = "type")]
    pub error_type: String,
}

/// Execution flags recognized in the `flags` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    /// Run only in strict mode
    #[serde(rename = "onlyStrict")]
    OnlyStrict,
    /// Run only in sloppy mode
    #[serde(rename = "noStrict")]
    NoStrict,
    /// Module goal
    #[serde(rename = "module")]
    Module,
    /// No harness files, no source modification
    #[serde(rename = "raw")]
    Raw,
    /// Completes through `$DONE`
    #[serde(rename = "async")]
    Async,
    /// Produced by the test generator
    #[serde(rename = "generated")]
    Generated,
    /// Requires an agent that cannot block
    #[serde(rename = "CanBlockIsFalse")]
    CanBlockIsFalse,
    /// Requires an agent that can block
    #[serde(rename = "CanBlockIsTrue")]
    CanBlockIsTrue,
    /// Outcome may vary between runs
    #[serde(rename = "non-deterministic")]
    NonDeterministic,
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Section ids like `es5id: 10.4` arrive as YAML numbers.
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_yaml::Value::Null) => None,
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected a scalar, found {:?}",
                other
            )))
        }
    })
}

/// Test262 test metadata parsed from YAML frontmatter
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestMetadata {
    /// Human-readable description of what the test verifies
    pub description: String,
    /// Additional information about the test
    pub info: Option<String>,
    /// Expected error for negative tests
    pub negative: Option<NegativeExpectation>,
    /// Helper files that must be loaded before the test
    pub includes: Vec<String>,
    /// Execution flags
    pub flags: Vec<Flag>,
    /// ECMAScript features required by this test
    pub features: Vec<String>,
    /// ES5.1 section identifier
    #[serde(deserialize_with = "scalar_string")]
    pub es5id: Option<String>,
    /// ES6 section identifier
    #[serde(deserialize_with = "scalar_string")]
    pub es6id: Option<String>,
    /// ES section identifier
    #[serde(deserialize_with = "scalar_string")]
    pub esid: Option<String>,
    /// Author of the test
    pub author: Option<String>,
    /// Locales required by Intl tests
    pub locale: Vec<String>,
    /// Globals the test defines (informational)
    pub defines: Vec<String>,
}

/// Why a metadata block could not be read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetadataError {
    /// No `/*--- ... ---*/` block in the source
    #[error("no YAML frontmatter found")]
    Missing,
    /// The block exists but is not valid metadata
    #[error("failed to parse YAML frontmatter: {0}")]
    Malformed(String),
}

impl TestMetadata {
    /// Parse YAML frontmatter from test file source
    ///
    /// Test262 files contain metadata in a YAML block between `/*---` and `---*/`
    pub fn parse(source: &str) -> Result<Self, MetadataError> {
        let yaml = frontmatter_re()
            .captures(source)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or(MetadataError::Missing)?;

        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml).map_err(|e| MetadataError::Malformed(e.to_string()))
    }

    /// Check whether a flag is present
    pub fn has_flag(&self, flag: Flag) -> bool {
        self.flags.contains(&flag)
    }

    /// Get the expected error type for negative tests
    pub fn expected_error_type(&self) -> Option<&str> {
        self.negative.as_ref().map(|n| n.error_type.as_str())
    }

    /// Check if test requires strict mode only
    pub fn is_strict_only(&self) -> bool {
        self.has_flag(Flag::OnlyStrict)
    }

    /// Check if test requires non-strict mode only
    pub fn is_no_strict(&self) -> bool {
        self.has_flag(Flag::NoStrict)
    }

    /// Check if test is an ES module test
    pub fn is_module(&self) -> bool {
        self.has_flag(Flag::Module)
    }

    /// Check if test is asynchronous
    pub fn is_async(&self) -> bool {
        self.has_flag(Flag::Async)
    }

    /// Check if test should use raw interpretation (no harness setup)
    pub fn is_raw(&self) -> bool {
        self.has_flag(Flag::Raw)
    }
}

/// Directive line used by SpiderMonkey's imported copy of the suite:
/// `// |reftest| skip-if(!this.Intl) error:SyntaxError module async`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReftestDirective {
    /// Unconditional `skip`
    pub skip: bool,
    /// Unconditional `fails`
    pub fails: bool,
    /// `error:Kind`
    pub error: Option<String>,
    /// `async`
    pub is_async: bool,
    /// `module`
    pub module: bool,
    /// Conditional terms (`skip-if(...)`, `fails-if(...)`, `shell-option(...)`, ...)
    pub conditions: Vec<String>,
}

impl ReftestDirective {
    /// Finds and parses the directive in the first lines of `source`.
    pub fn find(source: &str) -> Option<Self> {
        source
            .lines()
            .take(5)
            .find_map(|line| reftest_re().captures(line))
            .and_then(|c| c.get(1))
            .map(|m| Self::parse_terms(m.as_str()))
    }

    fn parse_terms(terms: &str) -> Self {
        let mut directive = Self::default();
        for term in split_terms(terms) {
            match term.as_str() {
                "skip" => directive.skip = true,
                "fails" => directive.fails = true,
                "async" => directive.is_async = true,
                "module" => directive.module = true,
                t if t.starts_with("error:") => {
                    directive.error = Some(t["error:".len()..].to_string());
                }
                _ => directive.conditions.push(term),
            }
        }
        directive
    }

    /// Lists disagreements between this directive and the YAML metadata.
    pub fn conflicts_with(&self, metadata: &TestMetadata) -> Vec<String> {
        let mut conflicts = Vec::new();
        if let Some(error) = &self.error {
            match metadata.expected_error_type() {
                Some(expected) if expected == error => {}
                Some(expected) => conflicts.push(format!(
                    "reftest error:{} disagrees with negative type {}",
                    error, expected
                )),
                None => conflicts.push(format!(
                    "reftest error:{} on a test without negative metadata",
                    error
                )),
            }
        }
        if self.is_async != metadata.is_async() {
            conflicts.push("reftest async marker disagrees with flags".to_string());
        }
        if self.module != metadata.is_module() {
            conflicts.push("reftest module marker disagrees with flags".to_string());
        }
        conflicts
    }
}

// Splits on whitespace outside parentheses; conditions may contain spaces.
fn split_terms(input: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in input.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    terms.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        terms.push(current);
    }
    terms
}

/// Test262 test file with source and parsed metadata
#[derive(Debug, Clone)]
pub struct TestFile {
    /// Path to the test file
    pub path: PathBuf,
    /// Stable case id: path relative to the test root, `/`-separated
    pub id: String,
    /// Source code of the test
    pub source: String,
    /// Parsed metadata from YAML frontmatter
    pub metadata: TestMetadata,
    /// SpiderMonkey reftest directive, if present
    pub reftest: Option<ReftestDirective>,
}

impl TestFile {
    /// Load a test file from disk, requiring a metadata block
    pub fn load<P: AsRef<Path>>(path: P) -> HarnessResult<Self> {
        Self::load_under(path, None, true)
    }

    /// Load a test file, computing its id relative to `root`
    ///
    /// With `require_metadata` off, a file without a metadata block loads
    /// with default metadata (synchronous, no flags).
    pub fn load_under<P: AsRef<Path>>(
        path: P,
        root: Option<&Path>,
        require_metadata: bool,
    ) -> HarnessResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let id = case_id(path, root);
        let mut file = Self::from_source(id, source, require_metadata).map_err(|source| {
            HarnessError::Metadata {
                path: path.display().to_string(),
                source,
            }
        })?;
        file.path = path.to_path_buf();
        Ok(file)
    }

    /// Build a test file from in-memory source
    pub fn from_source(
        id: impl Into<String>,
        source: impl Into<String>,
        require_metadata: bool,
    ) -> Result<Self, MetadataError> {
        let id = id.into();
        let source = source.into();
        let metadata = match TestMetadata::parse(&source) {
            Ok(metadata) => metadata,
            Err(MetadataError::Missing) if !require_metadata => TestMetadata::default(),
            Err(e) => return Err(e),
        };
        let reftest = ReftestDirective::find(&source);
        Ok(Self {
            path: PathBuf::from(&id),
            id,
            source,
            metadata,
            reftest,
        })
    }

    /// Get the test name (file name without extension)
    pub fn name(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.id)
    }

    /// Get the test code (source without metadata block)
    pub fn code(&self) -> String {
        frontmatter_with_trailer_re()
            .replace(&self.source, "")
            .to_string()
    }

    /// Module fixtures are imported by other tests and never run directly
    pub fn is_fixture(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.ends_with("_FIXTURE.js"))
            .unwrap_or(false)
    }
}

/// Stable id of a case: its path relative to `root`, `/`-separated
pub fn case_id(path: &Path, root: Option<&Path>) -> String {
    let relative = root
        .and_then(|root| path.strip_prefix(root).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
