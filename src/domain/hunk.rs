use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous run of alignment entries bounded by unchanged context.
///
/// `entries` is a half-open index range into the alignment produced by the
/// aligner. `context_before`/`context_after` count the leading and trailing
/// EQUAL entries kept inside the hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub entries: Range<usize>,
    pub context_before: usize,
    pub context_after: usize,
}

impl Hunk {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A collapsed run of unchanged lines between (or around) hunks.
///
/// `entries` is the hidden alignment range; it is empty when the hidden
/// lines were never materialized (hunk-only input, where the unchanged
/// middle of the file is known only by its line-number jump). `old_range`
/// and `new_range` are inclusive file line-number ranges so a consumer can
/// request on-demand expansion without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapsedGap {
    pub entries: Range<usize>,
    pub hidden: usize,
    pub old_range: Option<(u32, u32)>,
    pub new_range: Option<(u32, u32)>,
}

impl CollapsedGap {
    /// Whether the hidden lines exist in the changeset and can be expanded.
    pub fn is_materialized(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Ordered hunks plus the collapsed gaps between them.
///
/// Invariant: hunks and materialized gaps are non-overlapping and, taken in
/// segment order, cover the full alignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkSet {
    pub hunks: Vec<Hunk>,
    pub gaps: Vec<CollapsedGap>,
}

/// A hunk or gap in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Hunk(&'a Hunk),
    Gap(&'a CollapsedGap),
}

impl HunkSet {
    /// Hunks and gaps interleaved by alignment position.
    ///
    /// A zero-width gap sitting at the same position as a hunk start
    /// represents hidden lines *before* that hunk, so gaps sort first on
    /// ties.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments: Vec<Segment<'_>> = self
            .gaps
            .iter()
            .map(Segment::Gap)
            .chain(self.hunks.iter().map(Segment::Hunk))
            .collect();
        segments.sort_by_key(|seg| match seg {
            Segment::Gap(g) => (g.entries.start, 0),
            Segment::Hunk(h) => (h.entries.start, 1),
        });
        segments
    }
}
