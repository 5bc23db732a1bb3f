//! Change records: one line of repository status, parsed.

use std::fmt;

/// Classification of a porcelain status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
    Untracked,
    /// A code git may emit that none of the above covers (e.g. `T`).
    Unknown,
}

impl ChangeStatus {
    /// Classify a trimmed porcelain code such as `M`, `AM`, `UU` or `??`.
    pub fn from_code(code: &str) -> Self {
        if code == "??" {
            return Self::Untracked;
        }
        if code.contains('U') || code == "AA" || code == "DD" {
            return Self::Unmerged;
        }
        match code.chars().next() {
            Some('M') => Self::Modified,
            Some('A') => Self::Added,
            Some('D') => Self::Deleted,
            Some('R') => Self::Renamed,
            Some('C') => Self::Copied,
            _ => Self::Unknown,
        }
    }
}

/// One changed path as reported by the repository.
///
/// The raw code is kept so summaries can fall back to it
/// when the status is [`ChangeStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub code: String,
    pub path: String,
}

impl ChangeRecord {
    pub fn new(code: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: path.into(),
        }
    }

    /// Parse one line of `git status --porcelain` output.
    ///
    /// The first two columns are the status code, the path starts at column 3.
    /// Returns `None` for blank or truncated lines.
    pub fn parse_porcelain(line: &str) -> Option<Self> {
        if line.trim().is_empty() {
            return None;
        }
        let code = line.get(..2)?.trim();
        let path = line.get(3..)?.trim();
        if code.is_empty() || path.is_empty() {
            return None;
        }
        Some(Self::new(code, path))
    }

    pub fn status(&self) -> ChangeStatus {
        ChangeStatus::from_code(&self.code)
    }

    /// Human-readable status label for terminal output.
    pub fn describe(&self) -> &str {
        match self.status() {
            ChangeStatus::Modified => "Modified",
            ChangeStatus::Added => "Added",
            ChangeStatus::Deleted => "Deleted",
            ChangeStatus::Renamed => "Renamed",
            ChangeStatus::Copied => "Copied",
            ChangeStatus::Unmerged => "Updated but unmerged",
            ChangeStatus::Untracked => "Untracked",
            ChangeStatus::Unknown => self.code.as_str(),
        }
    }

    /// Short bracketed indicator used in chat notifications, e.g. `(M)`.
    ///
    /// Untracked files show as `(U)`; unrecognised codes are echoed verbatim.
    pub fn indicator(&self) -> String {
        match self.status() {
            ChangeStatus::Modified => "(M)".to_string(),
            ChangeStatus::Added => "(A)".to_string(),
            ChangeStatus::Deleted => "(D)".to_string(),
            ChangeStatus::Renamed => "(R)".to_string(),
            ChangeStatus::Copied => "(C)".to_string(),
            ChangeStatus::Untracked => "(U)".to_string(),
            ChangeStatus::Unmerged | ChangeStatus::Unknown => format!("({})", self.code),
        }
    }

    /// Final path component, or the whole path when it has none.
    pub fn file_name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.path)
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.describe(), self.path)
    }
}

/// Parse full porcelain output into change records, skipping blank lines.
pub fn parse_status(output: &str) -> Vec<ChangeRecord> {
    output
        .lines()
        .filter_map(ChangeRecord::parse_porcelain)
        .collect()
}

/// Commit message for a set of changes. Always embeds the change count.
pub fn commit_message(changes: &[ChangeRecord]) -> String {
    format!("Updated reports ({})", changes.len())
}
