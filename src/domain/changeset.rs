use serde::{Deserialize, Serialize};
use std::fmt;

use crate::infra::hash::fingerprint;

/// A single line of source text, addressed by its 1-based file line number.
///
/// The fingerprint is a digest of the raw text and is what comment anchoring
/// and move detection compare; two lines with equal text share a fingerprint
/// regardless of where they sit in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    pub number: u32,
    pub text: String,
    pub fingerprint: u64,
}

impl SourceLine {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        let fingerprint = fingerprint(&text);
        Self {
            number,
            text,
            fingerprint,
        }
    }
}

/// File-level change kind derived from the diff headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileChange {
    Added,
    Deleted,
    #[default]
    Modified,
    Renamed {
        from: String,
    },
    Binary,
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Deleted => write!(f, "deleted"),
            Self::Modified => write!(f, "modified"),
            Self::Renamed { from } => write!(f, "renamed from {from}"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// One file revision's worth of change.
///
/// Exclusively owns both line sequences; everything downstream (alignment
/// entries, hunks, render rows) refers back into `old_lines`/`new_lines` by
/// index so line text is allocated once per parse. Immutable after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Changeset {
    pub id: String,
    pub path: String,
    pub file_change: FileChange,
    pub old_lines: Vec<SourceLine>,
    pub new_lines: Vec<SourceLine>,
}

impl Changeset {
    /// Builds a changeset from the full old and new file contents.
    ///
    /// Inputs must already be newline-normalized; lines are numbered from 1.
    pub fn from_contents(
        id: impl Into<String>,
        path: impl Into<String>,
        old: &str,
        new: &str,
    ) -> Self {
        let old_lines = number_lines(old);
        let new_lines = number_lines(new);
        let file_change = match (old_lines.is_empty(), new_lines.is_empty()) {
            (true, false) => FileChange::Added,
            (false, true) => FileChange::Deleted,
            _ => FileChange::Modified,
        };

        Self {
            id: id.into(),
            path: path.into(),
            file_change,
            old_lines,
            new_lines,
        }
    }

    pub fn old_line(&self, idx: usize) -> Option<&SourceLine> {
        self.old_lines.get(idx)
    }

    pub fn new_line(&self, idx: usize) -> Option<&SourceLine> {
        self.new_lines.get(idx)
    }

    /// Total materialized line count across both sides.
    pub fn line_count(&self) -> usize {
        self.old_lines.len() + self.new_lines.len()
    }

    pub fn is_binary(&self) -> bool {
        self.file_change == FileChange::Binary
    }
}

/// Additions/deletions counts for one changeset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: u32,
    pub deletions: u32,
}

fn number_lines(text: &str) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| SourceLine::new(i as u32 + 1, line))
        .collect()
}
