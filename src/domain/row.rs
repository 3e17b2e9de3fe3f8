use serde::{Deserialize, Serialize};

use super::comment::AnchoredComment;

/// Which side of a modify row an intraline span highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSide {
    Old,
    New,
}

/// A character-level changed region within one line of a modify row.
///
/// Offsets are byte offsets into the line text, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntralineSpan {
    pub side: SpanSide,
    pub start: usize,
    pub end: usize,
}

/// A styled region produced by the syntax highlighter.
///
/// Highlight spans and intraline spans are independent overlay layers; they
/// are not required to align at span boundaries, and reconciling overlaps is
/// the view layer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    pub style: String,
}

/// Row classification, a closed tagged enum.
///
/// Extended only by adding variants, never by subclassing an open hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowKind {
    /// Matched context line present on both sides.
    Unchanged,
    Add,
    Remove,
    /// A paired remove/add whose sides are similar enough to show as one
    /// row with intraline highlighting.
    Modify,
    /// A removed line whose text reappears among the additions.
    MoveAway,
    /// An added line whose text was removed elsewhere in this changeset.
    MoveHere,
    /// An added line duplicating an unchanged line.
    Copy,
    /// Marker replacing a long run of unchanged lines.
    CollapsedGap {
        hidden: usize,
        old_range: Option<(u32, u32)>,
        new_range: Option<(u32, u32)>,
    },
    /// Placeholder for a binary or otherwise non-diffable file.
    BinaryPlaceholder { label: String },
    /// Trailing row carrying comments that no longer anchor to any line.
    CommentThread,
}

/// One display row of the final render sequence.
///
/// `old`/`new` are indices into the owning changeset's line vectors —
/// back-references, never copies. Rows are transient and rebuilt on every
/// parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRow {
    pub kind: RowKind,
    pub old: Option<usize>,
    pub new: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intraline: Vec<IntralineSpan>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<AnchoredComment>,
}

impl RenderRow {
    pub fn line(kind: RowKind, old: Option<usize>, new: Option<usize>) -> Self {
        Self {
            kind,
            old,
            new,
            intraline: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn marker(kind: RowKind) -> Self {
        Self::line(kind, None, None)
    }

    /// Whether this row represents an actual line change (not context or a
    /// structural marker).
    pub fn is_change(&self) -> bool {
        matches!(
            self.kind,
            RowKind::Add
                | RowKind::Remove
                | RowKind::Modify
                | RowKind::MoveAway
                | RowKind::MoveHere
                | RowKind::Copy
        )
    }
}
