//! Directory scanning and file movement.
//!
//! One [`Organizer`] works on one target directory. A scan pass enumerates
//! the directory's immediate children exactly once (no recursion): files
//! with a mapped extension are moved into their folder, stray subdirectories
//! are relocated under the "Super Folder", and extensions nobody claims are
//! collected for the classifier. The pass mutates the filesystem only; all
//! reporting happens on the returned [`ScanOutcome`].

use crate::config::FolderMap;
use crate::filter::ScanFilter;
use crate::placement::split_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Destination for subdirectories that are not managed folders.
pub const SUPER_FOLDER: &str = "Super Folder";

/// Upper bound on collision probes for one destination name.
const COLLISION_PROBE_CAP: u32 = 9999;

/// Errors from provisioning, scanning, and moving.
#[derive(Debug)]
pub enum MoveError {
    /// Target directory does not exist or is not a directory.
    InvalidTarget(PathBuf),
    /// Could not create a destination directory.
    CreateDirFailed { path: PathBuf, source: io::Error },
    /// Could not enumerate the target directory.
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// A rename failed for a reason other than an occupied destination.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// Every probed alternative name was taken.
    CollisionProbesExhausted { destination: PathBuf },
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveError::InvalidTarget(path) => {
                write!(f, "Target is not a directory: {}", path.display())
            }
            MoveError::CreateDirFailed { path, source } => {
                write!(f, "Failed to create {}: {}", path.display(), source)
            }
            MoveError::ReadDirFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            MoveError::RenameFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            MoveError::CollisionProbesExhausted { destination } => {
                write!(
                    f,
                    "No free name found for {} after {} attempts",
                    destination.display(),
                    COLLISION_PROBE_CAP
                )
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// One file moved during a scan pass.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    /// Entry name as it appeared in the target directory.
    pub file: String,
    /// Folder the file was placed in.
    pub folder: String,
    /// Path the file ended up at; differs from `file` under collision naming.
    pub destination: PathBuf,
}

/// Everything one scan pass did.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Files moved into their folders.
    pub moved: Vec<MoveRecord>,
    /// Stray subdirectories relocated under the Super Folder.
    pub relocated_dirs: Vec<String>,
    /// Extensions nobody claims, one entry per file occurrence.
    pub unknown: Vec<String>,
    /// Entries the scan rules left untouched.
    pub skipped: usize,
}

/// What a dry-run pass would do.
#[derive(Debug, Default)]
pub struct ScanPreview {
    /// (entry name, folder) pairs that would move.
    pub planned: Vec<(String, String)>,
    /// Subdirectories that would be relocated under the Super Folder.
    pub stray_dirs: Vec<String>,
    /// Extensions nobody claims, one entry per file occurrence.
    pub unknown: Vec<String>,
    /// Entries the scan rules would leave untouched.
    pub skipped: usize,
}

/// Probes `"{stem} (1).{ext}"`, `"{stem} (2).{ext}"`, … inside `folder` and
/// returns the first path that does not exist.
///
/// With an empty extension the probe is `"{stem} (n)"`. The existence check
/// and the later rename are not atomic; a concurrent external writer can
/// still take the name first.
pub fn next_available_name(
    folder: &Path,
    stem: &str,
    extension: &str,
) -> Result<PathBuf, MoveError> {
    for number in 1..=COLLISION_PROBE_CAP {
        let candidate = if extension.is_empty() {
            format!("{} ({})", stem, number)
        } else {
            format!("{} ({}).{}", stem, number, extension)
        };
        let path = folder.join(candidate);
        if !path.exists() {
            return Ok(path);
        }
    }

    Err(MoveError::CollisionProbesExhausted {
        destination: folder.join(stem),
    })
}

/// Scans one target directory and moves its entries.
pub struct Organizer<'a> {
    target: &'a Path,
    filter: &'a ScanFilter,
}

impl<'a> Organizer<'a> {
    /// Binds an organizer to a target directory.
    ///
    /// # Errors
    ///
    /// Returns `MoveError::InvalidTarget` unless the path exists and is a
    /// directory.
    pub fn new(target: &'a Path, filter: &'a ScanFilter) -> Result<Self, MoveError> {
        if !target.is_dir() {
            return Err(MoveError::InvalidTarget(target.to_path_buf()));
        }
        Ok(Self { target, filter })
    }

    /// Creates one subdirectory per mapping key. Idempotent; an existing
    /// folder is a no-op.
    pub fn ensure_folders(&self, map: &FolderMap) -> Result<(), MoveError> {
        for folder in map.folders() {
            let path = self.target.join(folder);
            fs::create_dir_all(&path).map_err(|e| MoveError::CreateDirFailed {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Runs one scan pass over the target directory.
    ///
    /// Each immediate child is handled exactly once:
    /// - entries the scan rules match are left in place;
    /// - subdirectories named like a mapping key or like the Super Folder
    ///   are managed destinations and stay put;
    /// - any other subdirectory is relocated under the Super Folder,
    ///   creating it on first use;
    /// - files whose extension has an owning folder are moved there, with
    ///   collision naming when the destination name is taken;
    /// - files with an unclaimed extension stay put and are reported.
    pub fn scan_and_move(&self, map: &FolderMap) -> Result<ScanOutcome, MoveError> {
        let mut outcome = ScanOutcome::default();

        for (name, is_file) in self.list_entries()? {
            if self.filter.should_skip(&name) {
                outcome.skipped += 1;
                continue;
            }

            if !is_file {
                if map.contains_folder(&name) || name == SUPER_FOLDER {
                    continue;
                }
                self.relocate_stray_dir(&name)?;
                outcome.relocated_dirs.push(name);
                continue;
            }

            let split = split_name(&name);
            match map.folder_for(&split.extension) {
                Some(folder) => {
                    let destination =
                        self.place_file(&name, split.stem, &split.extension, folder)?;
                    outcome.moved.push(MoveRecord {
                        file: name,
                        folder: folder.to_string(),
                        destination,
                    });
                }
                None => outcome.unknown.push(split.extension),
            }
        }

        Ok(outcome)
    }

    /// Runs the same analysis as [`Organizer::scan_and_move`] without
    /// touching the filesystem.
    pub fn preview(&self, map: &FolderMap) -> Result<ScanPreview, MoveError> {
        let mut preview = ScanPreview::default();

        for (name, is_file) in self.list_entries()? {
            if self.filter.should_skip(&name) {
                preview.skipped += 1;
                continue;
            }

            if !is_file {
                if !map.contains_folder(&name) && name != SUPER_FOLDER {
                    preview.stray_dirs.push(name);
                }
                continue;
            }

            let split = split_name(&name);
            match map.folder_for(&split.extension) {
                Some(folder) => preview.planned.push((name, folder.to_string())),
                None => preview.unknown.push(split.extension),
            }
        }

        Ok(preview)
    }

    /// Enumerates immediate children as (name, is-file) pairs.
    ///
    /// Sorted by name so pass output and collision numbering are
    /// deterministic regardless of readdir order.
    fn list_entries(&self) -> Result<Vec<(String, bool)>, MoveError> {
        let read_dir = fs::read_dir(self.target).map_err(|e| MoveError::ReadDirFailed {
            path: self.target.to_path_buf(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| MoveError::ReadDirFailed {
                path: self.target.to_path_buf(),
                source: e,
            })?;
            let is_file = entry.path().is_file();
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_file));
        }
        entries.sort();
        Ok(entries)
    }

    /// Moves one file into its folder, renaming on collision.
    ///
    /// The destination is pre-checked; if the rename still reports an
    /// occupied destination (the check-then-rename race), the collision
    /// namer supplies a fresh alternative and the rename is retried once.
    fn place_file(
        &self,
        name: &str,
        stem: &str,
        extension: &str,
        folder: &str,
    ) -> Result<PathBuf, MoveError> {
        let source = self.target.join(name);
        let folder_path = self.target.join(folder);

        let mut destination = folder_path.join(name);
        if destination.exists() {
            destination = next_available_name(&folder_path, stem, extension)?;
        }

        match fs::rename(&source, &destination) {
            Ok(()) => Ok(destination),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let retry = next_available_name(&folder_path, stem, extension)?;
                fs::rename(&source, &retry).map_err(|e| MoveError::RenameFailed {
                    from: source,
                    to: retry.clone(),
                    source: e,
                })?;
                Ok(retry)
            }
            Err(e) => Err(MoveError::RenameFailed {
                from: source,
                to: destination,
                source: e,
            }),
        }
    }

    /// Relocates a stray subdirectory under the Super Folder, creating the
    /// Super Folder on first use.
    fn relocate_stray_dir(&self, name: &str) -> Result<(), MoveError> {
        let super_path = self.target.join(SUPER_FOLDER);
        fs::create_dir_all(&super_path).map_err(|e| MoveError::CreateDirFailed {
            path: super_path.clone(),
            source: e,
        })?;

        let source = self.target.join(name);
        let destination = super_path.join(name);
        fs::rename(&source, &destination).map_err(|e| MoveError::RenameFailed {
            from: source,
            to: destination,
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn map_with(pairs: &[(&str, &str)]) -> FolderMap {
        let mut map = FolderMap::new();
        for (folder, ext) in pairs {
            map.assign(folder, ext).expect("assign failed");
        }
        map
    }

    fn organize(dir: &TempDir, map: &FolderMap) -> ScanOutcome {
        let filter = ScanFilter::defaults();
        let organizer = Organizer::new(dir.path(), &filter).expect("target should be valid");
        organizer.ensure_folders(map).expect("provisioning failed");
        organizer.scan_and_move(map).expect("scan failed")
    }

    #[test]
    fn test_new_rejects_missing_target() {
        let filter = ScanFilter::defaults();
        let result = Organizer::new(Path::new("/no/such/directory"), &filter);
        assert!(matches!(result, Err(MoveError::InvalidTarget(_))));
    }

    #[test]
    fn test_ensure_folders_is_idempotent() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let map = map_with(&[("Documents", "pdf"), ("Pictures", "png")]);
        let filter = ScanFilter::defaults();
        let organizer = Organizer::new(dir.path(), &filter).expect("target should be valid");

        organizer.ensure_folders(&map).expect("first run failed");
        organizer.ensure_folders(&map).expect("second run failed");

        assert!(dir.path().join("Documents").is_dir());
        assert!(dir.path().join("Pictures").is_dir());
    }

    #[test]
    fn test_mapped_file_is_moved() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("report.txt"), "contents").expect("write failed");

        let map = map_with(&[("Documents", "txt")]);
        let outcome = organize(&dir, &map);

        assert_eq!(outcome.moved.len(), 1);
        assert!(outcome.unknown.is_empty());
        assert!(!dir.path().join("report.txt").exists());
        assert!(dir.path().join("Documents").join("report.txt").is_file());
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("photo.PNG"), "contents").expect("write failed");

        let map = map_with(&[("Pictures", "png")]);
        let outcome = organize(&dir, &map);

        assert_eq!(outcome.moved.len(), 1);
        assert!(dir.path().join("Pictures").join("photo.PNG").is_file());
    }

    #[test]
    fn test_unknown_extension_stays_put() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("data.xyz"), "contents").expect("write failed");

        let map = map_with(&[("Documents", "txt")]);
        let outcome = organize(&dir, &map);

        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.unknown, vec!["xyz".to_string()]);
        assert!(dir.path().join("data.xyz").is_file());
    }

    #[test]
    fn test_unknown_list_keeps_duplicates() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("a.xyz"), "a").expect("write failed");
        fs::write(dir.path().join("b.xyz"), "b").expect("write failed");

        let outcome = organize(&dir, &FolderMap::new());
        assert_eq!(outcome.unknown, vec!["xyz".to_string(), "xyz".to_string()]);
    }

    #[test]
    fn test_file_without_extension_reports_empty_unknown() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("README"), "contents").expect("write failed");

        let outcome = organize(&dir, &FolderMap::new());
        assert_eq!(outcome.unknown, vec![String::new()]);
        assert!(dir.path().join("README").is_file());
    }

    #[test]
    fn test_second_pass_is_noop() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("report.txt"), "contents").expect("write failed");

        let map = map_with(&[("Documents", "txt")]);
        let first = organize(&dir, &map);
        let second = organize(&dir, &map);

        assert_eq!(first.moved.len(), 1);
        assert!(second.moved.is_empty());
        assert!(second.relocated_dirs.is_empty());
        assert!(second.unknown.is_empty());
    }

    #[test]
    fn test_collision_naming_sequence() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let map = map_with(&[("Documents", "txt")]);
        let filter = ScanFilter::defaults();
        let organizer = Organizer::new(dir.path(), &filter).expect("target should be valid");
        organizer.ensure_folders(&map).expect("provisioning failed");

        for content in ["one", "two", "three"] {
            fs::write(dir.path().join("report.txt"), content).expect("write failed");
            organizer.scan_and_move(&map).expect("scan failed");
        }

        let docs = dir.path().join("Documents");
        assert!(docs.join("report.txt").is_file());
        assert!(docs.join("report (1).txt").is_file());
        assert!(docs.join("report (2).txt").is_file());
    }

    #[test]
    fn test_collision_naming_without_extension() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("taken"), "").expect("write failed");
        fs::write(dir.path().join("taken (1)"), "").expect("write failed");

        let next = next_available_name(dir.path(), "taken", "").expect("probe failed");
        assert_eq!(next, dir.path().join("taken (2)"));
    }

    #[test]
    fn test_stray_dir_goes_to_super_folder() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(dir.path().join("random stuff")).expect("mkdir failed");

        let map = map_with(&[("Documents", "txt")]);
        let outcome = organize(&dir, &map);

        assert_eq!(outcome.relocated_dirs, vec!["random stuff".to_string()]);
        assert!(!dir.path().join("random stuff").exists());
        assert!(
            dir.path()
                .join(SUPER_FOLDER)
                .join("random stuff")
                .is_dir()
        );
    }

    #[test]
    fn test_managed_dirs_stay_put() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let map = map_with(&[("Documents", "txt")]);

        // Both the mapping folder and a leftover Super Folder are managed.
        fs::create_dir(dir.path().join(SUPER_FOLDER)).expect("mkdir failed");
        let outcome = organize(&dir, &map);

        assert!(outcome.relocated_dirs.is_empty());
        assert!(dir.path().join("Documents").is_dir());
        assert!(dir.path().join(SUPER_FOLDER).is_dir());
        assert!(!dir.path().join(SUPER_FOLDER).join(SUPER_FOLDER).exists());
    }

    #[test]
    fn test_filtered_entries_are_untouched() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join(".hidden.txt"), "contents").expect("write failed");

        let map = map_with(&[("Documents", "txt")]);
        let outcome = organize(&dir, &map);

        assert!(outcome.moved.is_empty());
        assert_eq!(outcome.skipped, 1);
        assert!(dir.path().join(".hidden.txt").is_file());
    }

    #[test]
    fn test_preview_reports_without_moving() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(dir.path().join("report.txt"), "contents").expect("write failed");
        fs::write(dir.path().join("data.xyz"), "contents").expect("write failed");
        fs::create_dir(dir.path().join("stray")).expect("mkdir failed");

        let map = map_with(&[("Documents", "txt")]);
        let filter = ScanFilter::defaults();
        let organizer = Organizer::new(dir.path(), &filter).expect("target should be valid");
        let preview = organizer.preview(&map).expect("preview failed");

        assert_eq!(
            preview.planned,
            vec![("report.txt".to_string(), "Documents".to_string())]
        );
        assert_eq!(preview.stray_dirs, vec!["stray".to_string()]);
        assert_eq!(preview.unknown, vec!["xyz".to_string()]);

        assert!(dir.path().join("report.txt").is_file());
        assert!(dir.path().join("data.xyz").is_file());
        assert!(dir.path().join("stray").is_dir());
        assert!(!dir.path().join("Documents").exists());
        assert!(!dir.path().join(SUPER_FOLDER).exists());
    }
}
