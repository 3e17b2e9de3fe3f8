use serde::{Deserialize, Serialize};

/// What a single alignment entry says about its line pair.
///
/// The aligner never emits a "modify" kind; pairing similar remove/add runs
/// into modify rows is the row classifier's job, so the alignment stays a
/// pure sequence-diff result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentKind {
    Equal,
    Add,
    Remove,
}

/// One row of the old/new line alignment.
///
/// `old` and `new` are indices into the owning changeset's line vectors, not
/// file line numbers. Invariants: indices are strictly increasing within each
/// side across the full alignment, and every line index appears in exactly
/// one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentEntry {
    pub old: Option<usize>,
    pub new: Option<usize>,
    pub kind: AlignmentKind,
}

impl AlignmentEntry {
    pub fn equal(old: usize, new: usize) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
            kind: AlignmentKind::Equal,
        }
    }

    pub fn add(new: usize) -> Self {
        Self {
            old: None,
            new: Some(new),
            kind: AlignmentKind::Add,
        }
    }

    pub fn remove(old: usize) -> Self {
        Self {
            old: Some(old),
            new: None,
            kind: AlignmentKind::Remove,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != AlignmentKind::Equal
    }
}
