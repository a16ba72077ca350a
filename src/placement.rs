//! Filename splitting for placement decisions.
//!
//! Placement works on literal suffixes only: a filename is split at its last
//! `.`, the part after it is the extension (compared case-insensitively),
//! everything before it is the stem. No content sniffing.

/// A filename split into stem and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName<'a> {
    /// Everything before the last `.`, or the whole name when there is none.
    pub stem: &'a str,
    /// Lowercased suffix after the last `.`; empty when there is none.
    pub extension: String,
}

/// Splits a filename at its last `.`.
///
/// A name without a `.` yields the whole name as the stem and an empty
/// extension.
///
/// # Examples
///
/// ```
/// use sortdir::placement::split_name;
///
/// assert_eq!(split_name("report.TXT").stem, "report");
/// assert_eq!(split_name("report.TXT").extension, "txt");
/// assert_eq!(split_name("archive.tar.gz").stem, "archive.tar");
/// assert_eq!(split_name("README").extension, "");
/// ```
pub fn split_name(file_name: &str) -> SplitName<'_> {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) => SplitName {
            stem,
            extension: extension.to_lowercase(),
        },
        None => SplitName {
            stem: file_name,
            extension: String::new(),
        },
    }
}
