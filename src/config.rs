//! The durable folder-to-extensions mapping.
//!
//! The mapping lives in a JSON document, by default `folders.json` in the
//! working directory:
//!
//! ```json
//! {
//!     "Documents": ["pdf", "txt"],
//!     "Pictures": ["png", "jpg"]
//! }
//! ```
//!
//! Extensions are stored lowercase without a leading dot; they are normalized
//! on load and on assignment. Each extension belongs to at most one folder:
//! a document that lists the same extension under two folders is rejected at
//! load time so a file can never be claimed by two destinations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from loading, validating, or persisting the mapping.
#[derive(Debug)]
pub enum ConfigError {
    /// Mapping file not found at the given path.
    NotFound(PathBuf),
    /// Mapping file is not valid JSON of the expected shape.
    Parse(String),
    /// IO failure while reading or writing the mapping.
    Io(String),
    /// The same extension is listed under two folders.
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(path) => {
                write!(f, "Mapping file not found: {}", path.display())
            }
            ConfigError::Parse(msg) => write!(f, "Invalid mapping file: {}", msg),
            ConfigError::Io(msg) => write!(f, "IO error on mapping file: {}", msg),
            ConfigError::DuplicateExtension {
                extension,
                first,
                second,
            } => {
                write!(
                    f,
                    "Extension '{}' is listed under both '{}' and '{}'",
                    extension, first, second
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Normalizes an extension to its stored form: trimmed, one leading dot
/// stripped, lowercase.
pub(crate) fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim();
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
    trimmed.to_lowercase()
}

/// The folder-to-extensions mapping.
///
/// Folder names are unique keys; iteration and serialization order are
/// deterministic (lexicographic). The map is always passed explicitly —
/// loaded once by the run loop, mutated only through [`FolderMap::assign`],
/// persisted with [`FolderMap::save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMap {
    folders: BTreeMap<String, Vec<String>>,
}

impl FolderMap {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates the mapping from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file does not exist,
    /// `ConfigError::Parse` on malformed JSON, and
    /// `ConfigError::DuplicateExtension` if one extension is claimed by two
    /// folders.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let folders: BTreeMap<String, Vec<String>> = raw
            .into_iter()
            .map(|(folder, exts)| {
                let exts = exts.iter().map(|e| normalize_extension(e)).collect();
                (folder, exts)
            })
            .collect();

        let map = Self { folders };
        map.validate()?;
        Ok(map)
    }

    /// Checks that no extension appears under two folders.
    fn validate(&self) -> Result<(), ConfigError> {
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (folder, extensions) in &self.folders {
            for ext in extensions {
                if let Some(previous) = owners.insert(ext.as_str(), folder.as_str())
                    && previous != folder
                {
                    return Err(ConfigError::DuplicateExtension {
                        extension: ext.clone(),
                        first: previous.to_string(),
                        second: folder.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Persists the mapping as pretty-printed JSON.
    ///
    /// The document is written to a sibling `.tmp` file first and renamed
    /// over the destination, so a partial write never corrupts the mapping.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&self.folders)
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| ConfigError::Io(e.to_string()))?;
        fs::rename(&tmp, path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Returns the folder owning the given extension, if any.
    ///
    /// Comparison is case-insensitive; a file whose extension has no owner
    /// is "unknown" to the scanner.
    pub fn folder_for(&self, extension: &str) -> Option<&str> {
        let wanted = normalize_extension(extension);
        self.folders
            .iter()
            .find(|(_, extensions)| extensions.iter().any(|e| *e == wanted))
            .map(|(folder, _)| folder.as_str())
    }

    /// Appends an extension to a folder's list, creating the folder entry if
    /// it does not exist yet.
    ///
    /// Assigning a pair that already exists is a no-op. Assigning an
    /// extension owned by a different folder is rejected, keeping the
    /// one-owner invariant intact.
    pub fn assign(&mut self, folder: &str, extension: &str) -> Result<(), ConfigError> {
        let ext = normalize_extension(extension);
        if let Some(owner) = self.folder_for(&ext) {
            if owner == folder {
                return Ok(());
            }
            return Err(ConfigError::DuplicateExtension {
                extension: ext,
                first: owner.to_string(),
                second: folder.to_string(),
            });
        }

        self.folders.entry(folder.to_string()).or_default().push(ext);
        Ok(())
    }

    /// True if the folder name is a mapping key.
    pub fn contains_folder(&self, name: &str) -> bool {
        self.folders.contains_key(name)
    }

    /// Folder names in iteration order.
    pub fn folder_names(&self) -> Vec<String> {
        self.folders.keys().cloned().collect()
    }

    /// Iterates over folder names.
    pub fn folders(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }

    /// Number of configured folders.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// True if no folders are configured.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}
