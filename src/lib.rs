//! Changeset alignment and rendering core for LaReview.
//!
//! Given a raw unified-diff hunk set (or the full old and new contents) for
//! one file revision, this crate reconstructs an aligned, line-addressable
//! view of the change, classifies each row, computes intraline diff spans,
//! re-anchors stored review comments across line-number drift and produces
//! the ordered render-row sequence a presentation layer consumes for
//! side-by-side or unified layouts.

pub mod changeset;
pub mod domain;
pub mod infra;

pub use changeset::{ChangesetParser, ChangesetRequest, ChangesetSource, ParsedChangeset};
