use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::infra::hash::fingerprint;

/// Side of the changeset a comment is anchored to.
///
/// `Old` covers comments left on removed lines; they stay addressable even
/// though the line no longer exists on the new side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSide {
    Old,
    New,
}

impl fmt::Display for CommentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

impl FromStr for CommentSide {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "old" => Ok(Self::Old),
            "new" => Ok(Self::New),
            other => Err(format!("Unknown comment side: {other}")),
        }
    }
}

/// An inline review comment as stored against a prior revision.
///
/// `line` is the file line number the comment was written at and
/// `anchor_fingerprint` is the digest of that line's text at the time.
/// Re-anchoring never mutates the stored comment; it produces an
/// [`AnchoredComment`] view instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineComment {
    pub id: String,
    pub side: CommentSide,
    pub line: u32,
    pub anchor_fingerprint: u64,
    pub body: String,
    pub author: String,
    #[serde(default)]
    pub created_at: String,
}

impl InlineComment {
    /// Creates a fresh comment anchored at `line`, fingerprinting the text
    /// the comment was written against.
    pub fn new(
        side: CommentSide,
        line: u32,
        anchored_text: &str,
        body: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            side,
            line,
            anchor_fingerprint: fingerprint(anchored_text),
            body: body.into(),
            author: author.into(),
            created_at: String::new(),
        }
    }
}

/// A comment resolved against the current changeset.
///
/// `resolved_line` is the line number the comment lands on in this revision;
/// `None` with `orphaned = true` means no matching line was found within the
/// search window. Orphaned comments are still returned so the view can show
/// them as trailing threads instead of dropping them silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchoredComment {
    pub comment: InlineComment,
    pub resolved_line: Option<u32>,
    pub orphaned: bool,
}

impl AnchoredComment {
    pub fn resolved(comment: InlineComment, line: u32) -> Self {
        Self {
            comment,
            resolved_line: Some(line),
            orphaned: false,
        }
    }

    pub fn orphaned(comment: InlineComment) -> Self {
        Self {
            comment,
            resolved_line: None,
            orphaned: true,
        }
    }
}
