//! Domain error types for the changeset core.
//!
//! Every variant here fails the whole changeset parse and is surfaced to the
//! caller; nothing is retried internally. Collaborator failures that degrade
//! gracefully (highlighting, event notification) are swallowed at the call
//! site instead of appearing here, and orphaned comments are a flagged
//! result, not an error.

use thiserror::Error;

/// Errors surfaced by changeset parsing and row building.
#[derive(Debug, Error)]
pub enum ChangesetError {
    /// An `@@` hunk header could not be parsed.
    #[error("Malformed hunk header: {0}")]
    MalformedHunkHeader(String),

    /// A hunk header's declared line counts disagree with its body.
    #[error("Hunk {hunk} {side} line count mismatch: header says {expected}, body has {actual}")]
    LineCountMismatch {
        hunk: usize,
        side: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Input rejected before alignment to bound the quadratic LCS cost.
    #[error("Input too large: {lines} lines exceeds cap of {max}")]
    OversizedInput { lines: usize, max: usize },

    /// Structural inconsistency between pipeline stages. An internal
    /// invariant violation, not a recoverable condition.
    #[error("Inconsistent changeset state: {0}")]
    Inconsistent(String),
}
