//! Scan rules: which directory entries the scanner must leave untouched.
//!
//! Rules live in an optional TOML file:
//!
//! ```toml
//! [rules]
//! include_hidden = false
//!
//! [rules.skip]
//! names = ["Thumbs.db"]
//! globs = ["*.part"]
//! extensions = ["crdownload"]
//! regex = []
//!
//! [rules.keep]
//! globs = []
//! ```
//!
//! Lookup order: an explicit `--rules` path, then `.sortdir.toml` in the
//! working directory, then `$HOME/.config/sortdir/rules.toml`, then built-in
//! defaults (hidden names skipped, nothing else). Keep-globs are a whitelist
//! that overrides every skip rule.

use crate::placement::split_name;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from loading or compiling scan rules.
#[derive(Debug)]
pub enum FilterError {
    /// Explicitly requested rules file does not exist.
    NotFound(PathBuf),
    /// Rules file is not valid TOML of the expected shape.
    Parse(String),
    /// IO failure while reading the rules file.
    Io(String),
    /// A glob pattern failed to compile.
    BadGlob(String),
    /// A regex pattern failed to compile, with the compiler's reason.
    BadRegex { pattern: String, reason: String },
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::NotFound(path) => {
                write!(f, "Rules file not found: {}", path.display())
            }
            FilterError::Parse(msg) => write!(f, "Invalid rules file: {}", msg),
            FilterError::Io(msg) => write!(f, "IO error reading rules file: {}", msg),
            FilterError::BadGlob(pattern) => write!(f, "Invalid glob pattern '{}'", pattern),
            FilterError::BadRegex { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for FilterError {}

/// On-disk shape of the rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Rules,
}

/// The `[rules]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rules {
    /// Scan entries whose name starts with `.`. Off by default.
    #[serde(default)]
    pub include_hidden: bool,

    #[serde(default)]
    pub skip: SkipRules,

    #[serde(default)]
    pub keep: KeepRules,
}

/// Entries the scanner leaves in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkipRules {
    /// Exact entry names.
    #[serde(default)]
    pub names: Vec<String>,

    /// Glob patterns matched against the entry name.
    #[serde(default)]
    pub globs: Vec<String>,

    /// Extensions, matched with the same last-dot rule placement uses.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Whitelist overriding every skip rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeepRules {
    /// Glob patterns matched against the entry name.
    #[serde(default)]
    pub globs: Vec<String>,
}

impl RulesFile {
    /// Loads rules from the explicit path, the lookup cascade, or defaults.
    ///
    /// # Errors
    ///
    /// An explicitly requested file that is missing or malformed is an
    /// error; a malformed file found through the cascade is too. Absence of
    /// any rules file is not.
    pub fn load(rules_path: Option<&Path>) -> Result<Self, FilterError> {
        if let Some(path) = rules_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(".sortdir.toml");
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Ok(home) = std::env::var("HOME") {
            let in_home = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("rules.toml");
            if in_home.exists() {
                return Self::load_from_file(&in_home);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, FilterError> {
        if !path.exists() {
            return Err(FilterError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| FilterError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| FilterError::Parse(e.to_string()))
    }

    /// Validates and pre-compiles the rules for per-entry matching.
    pub fn compile(self) -> Result<ScanFilter, FilterError> {
        ScanFilter::new(self.rules)
    }
}

/// Compiled scan rules; patterns are parsed once, matching is per name.
pub struct ScanFilter {
    include_hidden: bool,
    skip_names: HashSet<String>,
    skip_extensions: HashSet<String>,
    skip_globs: Vec<Pattern>,
    skip_regexes: Vec<Regex>,
    keep_globs: Vec<Pattern>,
}

impl ScanFilter {
    fn new(rules: Rules) -> Result<Self, FilterError> {
        let compile_globs = |patterns: &[String]| -> Result<Vec<Pattern>, FilterError> {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(|_| FilterError::BadGlob(p.clone())))
                .collect()
        };

        let skip_globs = compile_globs(&rules.skip.globs)?;
        let keep_globs = compile_globs(&rules.keep.globs)?;

        let skip_regexes = rules
            .skip
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| FilterError::BadRegex {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            skip_names: rules.skip.names.into_iter().collect(),
            skip_extensions: rules
                .skip
                .extensions
                .iter()
                .map(|e| crate::config::normalize_extension(e))
                .collect(),
            skip_globs,
            skip_regexes,
            keep_globs,
        })
    }

    /// A filter with the built-in defaults.
    pub fn defaults() -> Self {
        Self::new(Rules::default()).expect("default rules always compile")
    }

    /// Adds an exact entry name to the skip set.
    ///
    /// The run loop uses this to shield the live mapping and rules files
    /// when they sit inside the target directory.
    pub fn skip_name(&mut self, name: &str) {
        self.skip_names.insert(name.to_string());
    }

    /// True if the scanner must leave this entry untouched.
    ///
    /// Keep-globs win over everything; then hidden names, exact names,
    /// extensions, skip-globs, and skip-regexes, in that order.
    pub fn should_skip(&self, name: &str) -> bool {
        if self.keep_globs.iter().any(|g| g.matches(name)) {
            return false;
        }

        if !self.include_hidden && name.starts_with('.') {
            return true;
        }

        if self.skip_names.contains(name) {
            return true;
        }

        let extension = split_name(name).extension;
        if !extension.is_empty() && self.skip_extensions.contains(&extension) {
            return true;
        }

        if self.skip_globs.iter().any(|g| g.matches(name)) {
            return true;
        }

        self.skip_regexes.iter().any(|r| r.is_match(name))
    }
}
