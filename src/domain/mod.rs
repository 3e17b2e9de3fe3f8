//! Domain types for the changeset core.
//! Defines the data model shared by every pipeline stage: source lines and
//! changesets, alignment entries, hunks, inline comments and render rows.

pub mod alignment;
pub mod changeset;
pub mod comment;
pub mod error;
pub mod hunk;
pub mod row;

pub use alignment::*;
pub use changeset::*;
pub use comment::*;
pub use error::*;
pub use hunk::*;
pub use row::*;
