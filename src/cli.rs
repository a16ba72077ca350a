//! Run loop: scan, classify, repeat until every extension is covered.
//!
//! One run alternates between two phases. A scan pass enumerates the target
//! directory once and moves everything it can. If the pass surfaced unknown
//! extensions, the classifier assigns them to folders, the mapping is
//! persisted, new folders are provisioned, and the next pass starts. A pass
//! with no unknowns ends the run: every classification strictly grows folder
//! coverage, so the loop converges.

use crate::config::{ConfigError, FolderMap};
use crate::filter::{FilterError, RulesFile, ScanFilter};
use crate::organizer::{MoveError, Organizer, ScanOutcome};
use crate::output::OutputFormatter;
use crate::prompt::{AssignmentSource, ClassifyError, NEW_FOLDER_MARKER, resolve_unknowns};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory being organized.
    pub target: PathBuf,
    /// Path of the JSON mapping file.
    pub mapping: PathBuf,
    /// Explicit scan rules file, if any.
    pub rules: Option<PathBuf>,
    /// Analyze and report without touching the filesystem.
    pub dry_run: bool,
}

/// Totals across all passes of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Scan passes performed.
    pub passes: usize,
    /// Files moved into folders.
    pub moved_files: usize,
    /// Stray subdirectories relocated.
    pub relocated_dirs: usize,
}

/// Fatal errors from a run, unified across the module boundaries.
#[derive(Debug)]
pub enum RunError {
    Config(ConfigError),
    Filter(FilterError),
    Move(MoveError),
    Classify(ClassifyError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Config(e) => write!(f, "{}", e),
            RunError::Filter(e) => write!(f, "{}", e),
            RunError::Move(e) => write!(f, "{}", e),
            RunError::Classify(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        RunError::Config(e)
    }
}

impl From<FilterError> for RunError {
    fn from(e: FilterError) -> Self {
        RunError::Filter(e)
    }
}

impl From<MoveError> for RunError {
    fn from(e: MoveError) -> Self {
        RunError::Move(e)
    }
}

impl From<ClassifyError> for RunError {
    fn from(e: ClassifyError) -> Self {
        RunError::Classify(e)
    }
}

/// Runs the organizer to convergence.
///
/// Loads the mapping and scan rules, provisions all configured folders, then
/// alternates scan and classification passes until a pass yields no unknown
/// extensions. The mapping file is rewritten after every classification, so
/// an interrupted run keeps its assignments. With `dry_run` set, a single
/// preview pass is reported and nothing on disk changes.
pub fn run(opts: &RunOptions, prompts: &mut dyn AssignmentSource) -> Result<RunSummary, RunError> {
    let mut map = FolderMap::load(&opts.mapping)?;

    let mut filter = RulesFile::load(opts.rules.as_deref())?.compile()?;
    shield_file(&mut filter, &opts.mapping, &opts.target);
    if let Some(rules_path) = &opts.rules {
        shield_file(&mut filter, rules_path, &opts.target);
    }

    let organizer = Organizer::new(&opts.target, &filter)?;

    if opts.dry_run {
        return dry_run(&organizer, &map, &opts.target);
    }

    OutputFormatter::info(&format!("Organizing: {}", opts.target.display()));
    organizer.ensure_folders(&map)?;

    let mut summary = RunSummary::default();
    let mut folder_counts: BTreeMap<String, usize> = BTreeMap::new();

    loop {
        let spinner = OutputFormatter::scan_spinner("Scanning...");
        let outcome = organizer.scan_and_move(&map);
        spinner.finish_and_clear();
        let outcome = outcome?;

        summary.passes += 1;
        summary.moved_files += outcome.moved.len();
        summary.relocated_dirs += outcome.relocated_dirs.len();
        report_pass(&outcome, &mut folder_counts);

        if outcome.unknown.is_empty() {
            break;
        }

        OutputFormatter::header("Unknown extensions");
        OutputFormatter::plain(&format!("Folders: {:?}", map.folder_names()));
        OutputFormatter::info(&format!(
            "Assign a folder for each extension ('{}Name' creates a new folder).",
            NEW_FOLDER_MARKER
        ));

        resolve_unknowns(&outcome.unknown, &mut map, prompts)?;
        map.save(&opts.mapping)?;
        organizer.ensure_folders(&map)?;
    }

    if summary.moved_files == 0 && summary.relocated_dirs == 0 {
        OutputFormatter::plain("Nothing to organize.");
    } else {
        OutputFormatter::summary_table(&folder_counts, summary.moved_files);
        OutputFormatter::success("Organization complete.");
    }

    Ok(summary)
}

/// Prints what one completed pass did.
fn report_pass(outcome: &ScanOutcome, folder_counts: &mut BTreeMap<String, usize>) {
    for record in &outcome.moved {
        let renamed = record
            .destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if renamed == record.file {
            OutputFormatter::success(&format!("{} → {}/", record.file, record.folder));
        } else {
            OutputFormatter::success(&format!(
                "{} → {}/{} (renamed)",
                record.file, record.folder, renamed
            ));
        }
        *folder_counts.entry(record.folder.clone()).or_insert(0) += 1;
    }

    for dir in &outcome.relocated_dirs {
        OutputFormatter::success(&format!("{}/ → {}/", dir, crate::organizer::SUPER_FOLDER));
    }
}

/// Single preview pass: report, never mutate.
fn dry_run(
    organizer: &Organizer<'_>,
    map: &FolderMap,
    target: &Path,
) -> Result<RunSummary, RunError> {
    OutputFormatter::dry_run_notice(&format!("Analyzing: {}", target.display()));

    let preview = organizer.preview(map)?;

    for (file, folder) in &preview.planned {
        OutputFormatter::plain(&format!(" - {} → {}/", file, folder));
    }
    for dir in &preview.stray_dirs {
        OutputFormatter::plain(&format!(
            " - {}/ → {}/",
            dir,
            crate::organizer::SUPER_FOLDER
        ));
    }

    if !preview.unknown.is_empty() {
        let mut distinct: Vec<&String> = Vec::new();
        for ext in &preview.unknown {
            if !distinct.contains(&ext) {
                distinct.push(ext);
            }
        }
        OutputFormatter::warning(&format!(
            "{} unknown extension(s) would need classification: {:?}",
            distinct.len(),
            distinct
        ));
    }

    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(RunSummary {
        passes: 1,
        ..Default::default()
    })
}

/// Shields a live configuration file from its own scan: when `file` sits
/// directly inside `target`, its name joins the skip set.
fn shield_file(filter: &mut ScanFilter, file: &Path, target: &Path) {
    let (Ok(file), Ok(target)) = (file.canonicalize(), target.canonicalize()) else {
        return;
    };
    if file.parent() == Some(target.as_path())
        && let Some(name) = file.file_name()
    {
        filter.skip_name(&name.to_string_lossy());
    }
}
