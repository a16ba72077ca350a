//! Interactive classification of unknown extensions.
//!
//! After a scan pass, every extension nobody claims is put to an
//! [`AssignmentSource`]: the operator names an existing folder, or creates a
//! new one by prefixing the answer with `!` (`!Docs` creates "Docs"). The
//! console implementation prompts on stdin; [`ScriptedAssignments`] answers
//! from a queue so the loop runs unattended in tests and batch callers.

use crate::config::{ConfigError, FolderMap};
use dialoguer::Input;
use dialoguer::theme::ColorfulTheme;
use std::collections::VecDeque;

/// Marker prefix that turns an answer into "create this folder".
pub const NEW_FOLDER_MARKER: char = '!';

/// Errors from classifying unknown extensions.
#[derive(Debug)]
pub enum ClassifyError {
    /// Reading the operator's answer failed.
    Prompt(String),
    /// A scripted source ran out of answers.
    ScriptExhausted { extension: String },
    /// An answer named a folder that does not exist, without the marker.
    UnknownFolder { folder: String },
    /// Applying an assignment violated the mapping's invariants.
    Config(ConfigError),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            ClassifyError::ScriptExhausted { extension } => {
                write!(f, "No scripted answer left for extension '{}'", extension)
            }
            ClassifyError::UnknownFolder { folder } => {
                write!(
                    f,
                    "'{}' is not a configured folder (prefix with '{}' to create it)",
                    folder, NEW_FOLDER_MARKER
                )
            }
            ClassifyError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<ConfigError> for ClassifyError {
    fn from(e: ConfigError) -> Self {
        ClassifyError::Config(e)
    }
}

/// One answered prompt: where an extension should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Destination folder name, marker stripped.
    pub folder: String,
    /// True when the answer carried the new-folder marker.
    pub create_new: bool,
}

/// Parses a raw answer line into an [`Assignment`].
///
/// The line is trimmed; a leading [`NEW_FOLDER_MARKER`] is stripped and sets
/// `create_new`. Returns `None` when nothing (or only the marker) is left.
pub fn parse_assignment(input: &str) -> Option<Assignment> {
    let trimmed = input.trim();
    let (create_new, name) = match trimmed.strip_prefix(NEW_FOLDER_MARKER) {
        Some(rest) => (true, rest.trim()),
        None => (false, trimmed),
    };

    if name.is_empty() {
        return None;
    }

    Some(Assignment {
        folder: name.to_string(),
        create_new,
    })
}

/// Supplies one folder assignment per unknown extension.
///
/// Abstracting the answer source keeps the run loop free of console
/// specifics; tests and non-interactive callers substitute
/// [`ScriptedAssignments`].
pub trait AssignmentSource {
    /// Produces the assignment for one extension. `folders` lists the
    /// currently configured folder names for display and validation.
    fn assign(
        &mut self,
        extension: &str,
        folders: &[String],
    ) -> Result<Assignment, ClassifyError>;
}

/// Prompts the operator on the console, re-asking until the answer is a
/// configured folder or a marker-prefixed new one.
#[derive(Default)]
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentSource for ConsolePrompt {
    fn assign(
        &mut self,
        extension: &str,
        folders: &[String],
    ) -> Result<Assignment, ClassifyError> {
        let shown = if extension.is_empty() {
            "(no extension)"
        } else {
            extension
        };

        loop {
            let answer: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("{} ::", shown))
                .allow_empty(true)
                .interact_text()
                .map_err(|e| ClassifyError::Prompt(e.to_string()))?;

            match parse_assignment(&answer) {
                None => {
                    eprintln!("Folder name must not be empty.");
                }
                Some(assignment)
                    if !assignment.create_new
                        && !folders.contains(&assignment.folder) =>
                {
                    eprintln!(
                        "'{}' is not a configured folder; pick one of {:?} or prefix with '{}' to create it.",
                        assignment.folder, folders, NEW_FOLDER_MARKER
                    );
                }
                Some(assignment) => return Ok(assignment),
            }
        }
    }
}

/// Answers prompts from a pre-seeded queue, in order.
#[derive(Debug, Default)]
pub struct ScriptedAssignments {
    answers: VecDeque<Assignment>,
}

impl ScriptedAssignments {
    /// Builds a source from raw answer lines, parsed like console input.
    /// Lines that parse to nothing are dropped.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            answers: lines
                .into_iter()
                .filter_map(|line| parse_assignment(line.as_ref()))
                .collect(),
        }
    }

    /// Queues one more answer.
    pub fn push(&mut self, assignment: Assignment) {
        self.answers.push_back(assignment);
    }
}

impl AssignmentSource for ScriptedAssignments {
    fn assign(
        &mut self,
        extension: &str,
        folders: &[String],
    ) -> Result<Assignment, ClassifyError> {
        let assignment =
            self.answers
                .pop_front()
                .ok_or_else(|| ClassifyError::ScriptExhausted {
                    extension: extension.to_string(),
                })?;

        if !assignment.create_new && !folders.contains(&assignment.folder) {
            return Err(ClassifyError::UnknownFolder {
                folder: assignment.folder,
            });
        }

        Ok(assignment)
    }
}

/// Resolves every distinct unknown extension against the mapping.
///
/// Duplicate occurrences are prompted once, in first-seen order. Each answer
/// is applied through [`FolderMap::assign`]; "creating" a folder that
/// already exists appends to it. The caller persists the mapping and
/// re-provisions folders afterwards.
///
/// Returns the number of extensions assigned.
pub fn resolve_unknowns(
    unknowns: &[String],
    map: &mut FolderMap,
    source: &mut dyn AssignmentSource,
) -> Result<usize, ClassifyError> {
    let mut distinct: Vec<&String> = Vec::new();
    for ext in unknowns {
        if !distinct.contains(&ext) {
            distinct.push(ext);
        }
    }

    let mut assigned = 0;
    for extension in distinct {
        let folders = map.folder_names();
        let assignment = source.assign(extension, &folders)?;
        map.assign(&assignment.folder, extension)?;
        assigned += 1;
    }

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_answer() {
        let assignment = parse_assignment("Documents").expect("should parse");
        assert_eq!(assignment.folder, "Documents");
        assert!(!assignment.create_new);
    }

    #[test]
    fn test_parse_marker_answer() {
        let assignment = parse_assignment("!Docs").expect("should parse");
        assert_eq!(assignment.folder, "Docs");
        assert!(assignment.create_new);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let assignment = parse_assignment("  ! My Folder  ").expect("should parse");
        assert_eq!(assignment.folder, "My Folder");
        assert!(assignment.create_new);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(parse_assignment(""), None);
        assert_eq!(parse_assignment("   "), None);
        assert_eq!(parse_assignment("!"), None);
        assert_eq!(parse_assignment("!   "), None);
    }

    #[test]
    fn test_scripted_answers_in_order() {
        let mut source = ScriptedAssignments::from_lines(["!Docs", "Docs"]);
        let folders = vec!["Docs".to_string()];

        let first = source.assign("xyz", &[]).expect("first answer");
        assert!(first.create_new);
        let second = source.assign("abc", &folders).expect("second answer");
        assert!(!second.create_new);
        assert_eq!(second.folder, "Docs");
    }

    #[test]
    fn test_scripted_exhaustion() {
        let mut source = ScriptedAssignments::default();
        let result = source.assign("xyz", &[]);
        assert!(matches!(
            result,
            Err(ClassifyError::ScriptExhausted { .. })
        ));
    }

    #[test]
    fn test_scripted_rejects_unknown_folder_without_marker() {
        let mut source = ScriptedAssignments::from_lines(["Nowhere"]);
        let result = source.assign("xyz", &[]);
        assert!(matches!(result, Err(ClassifyError::UnknownFolder { .. })));
    }

    #[test]
    fn test_resolve_unknowns_creates_and_appends() {
        let mut map = FolderMap::new();
        map.assign("Documents", "txt").expect("assign failed");

        let mut source = ScriptedAssignments::from_lines(["!Docs", "Documents"]);
        let assigned = resolve_unknowns(
            &["xyz".to_string(), "log".to_string()],
            &mut map,
            &mut source,
        )
        .expect("resolution failed");

        assert_eq!(assigned, 2);
        assert_eq!(map.folder_for("xyz"), Some("Docs"));
        assert_eq!(map.folder_for("log"), Some("Documents"));
    }

    #[test]
    fn test_resolve_unknowns_prompts_once_per_distinct_extension() {
        let mut map = FolderMap::new();
        // One answer is enough for three occurrences of the same extension.
        let mut source = ScriptedAssignments::from_lines(["!Docs"]);

        let unknowns = vec!["xyz".to_string(), "xyz".to_string(), "xyz".to_string()];
        let assigned =
            resolve_unknowns(&unknowns, &mut map, &mut source).expect("resolution failed");

        assert_eq!(assigned, 1);
        assert_eq!(map.folder_for("xyz"), Some("Docs"));
    }

    #[test]
    fn test_resolve_unknowns_marker_on_existing_folder_appends() {
        let mut map = FolderMap::new();
        map.assign("Docs", "txt").expect("assign failed");

        let mut source = ScriptedAssignments::from_lines(["!Docs"]);
        resolve_unknowns(&["xyz".to_string()], &mut map, &mut source)
            .expect("resolution failed");

        assert_eq!(map.folder_for("txt"), Some("Docs"));
        assert_eq!(map.folder_for("xyz"), Some("Docs"));
    }

    #[test]
    fn test_resolve_unknowns_handles_empty_extension() {
        let mut map = FolderMap::new();
        let mut source = ScriptedAssignments::from_lines(["!Plain"]);

        resolve_unknowns(&[String::new()], &mut map, &mut source).expect("resolution failed");
        assert_eq!(map.folder_for(""), Some("Plain"));
    }
}
