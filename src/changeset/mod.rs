//! The changeset pipeline.
//!
//! Orchestrates parse → align → normalize → classify → anchor → build into
//! one synchronous, CPU-only computation per file revision. Collaborators
//! (highlighter, comment store, attachments, event bus) are injected through
//! the constructor; parsing several changesets in parallel is safe because
//! each one exclusively owns its line data.

pub mod align;
pub mod anchor;
pub mod build;
pub mod classify;
pub mod normalize;
pub mod parse;

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    AlignmentEntry, AlignmentKind, Changeset, ChangesetError, CollapsedGap, DiffStats, HunkSet,
    RenderRow, RowKind, Segment, SourceLine, StyleSpan,
};
use crate::infra::attachments::{AttachmentResolver, NoAttachments};
use crate::infra::config::ChangesetConfig;
use crate::infra::events::{ChangesetParsed, EventBus, NullEventBus};
use crate::infra::highlight::{
    HighlightCache, SyntaxHighlighter, SyntectHighlighter, detect_language, highlight_with_cache,
};
use crate::infra::store::{CommentStore, MemoryCommentStore};

/// Where the changeset's content comes from.
pub enum ChangesetSource<'a> {
    /// Raw unified-diff hunk text; only hunk-covered lines materialize.
    UnifiedDiff { text: &'a str },
    /// Full old and new file contents, already newline-normalized.
    FileContents { old: &'a str, new: &'a str },
}

/// One parse request.
pub struct ChangesetRequest<'a> {
    pub id: String,
    /// File path; resolved from the diff headers when absent.
    pub path: Option<String>,
    /// Language token for the highlighter; detected from the path extension
    /// when absent.
    pub language_hint: Option<String>,
    pub source: ChangesetSource<'a>,
}

/// The parsed, render-ready result.
///
/// Serializable with stable snake_case field names for the view layer. Rows
/// hold indices into `changeset`; resolve them through [`Self::old_line`] /
/// [`Self::new_line`].
#[derive(Serialize)]
pub struct ParsedChangeset {
    pub changeset: Changeset,
    pub rows: Vec<RenderRow>,
    pub stats: DiffStats,
    pub hunks: HunkSet,
    pub alignment: Vec<AlignmentEntry>,
    pub language: Option<String>,
    #[serde(skip)]
    cache: HighlightCache,
    #[serde(skip)]
    highlighter: Arc<dyn SyntaxHighlighter>,
}

impl std::fmt::Debug for ParsedChangeset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedChangeset")
            .field("changeset", &self.changeset)
            .field("rows", &self.rows)
            .field("stats", &self.stats)
            .field("hunks", &self.hunks)
            .field("alignment", &self.alignment)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl ParsedChangeset {
    pub fn old_line(&self, row: &RenderRow) -> Option<&SourceLine> {
        row.old.and_then(|idx| self.changeset.old_line(idx))
    }

    pub fn new_line(&self, row: &RenderRow) -> Option<&SourceLine> {
        row.new.and_then(|idx| self.changeset.new_line(idx))
    }

    /// Style spans for one line, read through the parse session's cache.
    ///
    /// The classifier already populated the cache for every rendered line;
    /// this stays cheap at render time.
    pub fn style_spans(&self, line: &SourceLine) -> Arc<[StyleSpan]> {
        highlight_with_cache(
            line,
            self.language.as_deref(),
            self.highlighter.as_ref(),
            &self.cache,
        )
    }

    /// Expands a collapsed-gap row into UNCHANGED rows, without re-parsing.
    ///
    /// Fails with [`ChangesetError::Inconsistent`] if the row is not a gap
    /// marker or the gap's lines were never materialized (hunk-only input).
    pub fn expand_gap(&self, row_idx: usize) -> Result<Vec<RenderRow>, ChangesetError> {
        let row = self.rows.get(row_idx).ok_or_else(|| {
            ChangesetError::Inconsistent(format!("no row at index {row_idx}"))
        })?;
        if !matches!(row.kind, RowKind::CollapsedGap { .. }) {
            return Err(ChangesetError::Inconsistent(format!(
                "row {row_idx} is not a collapsed gap"
            )));
        }

        let ordinal = self.rows[..row_idx]
            .iter()
            .filter(|r| matches!(r.kind, RowKind::CollapsedGap { .. }))
            .count();
        let gap = self
            .gaps_in_order()
            .into_iter()
            .nth(ordinal)
            .ok_or_else(|| {
                ChangesetError::Inconsistent("gap row without a matching gap".to_string())
            })?;
        if !gap.is_materialized() {
            return Err(ChangesetError::Inconsistent(
                "gap content was never materialized".to_string(),
            ));
        }

        Ok(self.alignment[gap.entries.clone()]
            .iter()
            .map(|entry| RenderRow::line(RowKind::Unchanged, entry.old, entry.new))
            .collect())
    }

    fn gaps_in_order(&self) -> Vec<&CollapsedGap> {
        self.hunks
            .segments()
            .into_iter()
            .filter_map(|seg| match seg {
                Segment::Gap(gap) => Some(gap),
                Segment::Hunk(_) => None,
            })
            .collect()
    }
}

/// Parses changesets with explicitly injected collaborators.
pub struct ChangesetParser {
    config: ChangesetConfig,
    highlighter: Arc<dyn SyntaxHighlighter>,
    comments: Arc<dyn CommentStore>,
    attachments: Arc<dyn AttachmentResolver>,
    events: Arc<dyn EventBus>,
}

impl ChangesetParser {
    pub fn new(config: ChangesetConfig) -> Self {
        Self {
            config,
            highlighter: Arc::new(SyntectHighlighter::new()),
            comments: Arc::new(MemoryCommentStore::new()),
            attachments: Arc::new(NoAttachments),
            events: Arc::new(NullEventBus),
        }
    }

    pub fn with_highlighter(mut self, highlighter: Arc<dyn SyntaxHighlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn with_comment_store(mut self, store: Arc<dyn CommentStore>) -> Self {
        self.comments = store;
        self
    }

    pub fn with_attachments(mut self, attachments: Arc<dyn AttachmentResolver>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_event_bus(mut self, events: Arc<dyn EventBus>) -> Self {
        self.events = events;
        self
    }

    /// Runs the full pipeline for one file revision.
    pub fn parse(&self, request: &ChangesetRequest<'_>) -> Result<ParsedChangeset, ChangesetError> {
        let changeset = match &request.source {
            ChangesetSource::UnifiedDiff { text } => {
                parse::from_unified_diff(&request.id, request.path.as_deref(), text)?
            }
            ChangesetSource::FileContents { old, new } => Changeset::from_contents(
                request.id.clone(),
                request.path.clone().unwrap_or_default(),
                old,
                new,
            ),
        };

        if changeset.is_binary() {
            return Ok(self.binary_result(changeset));
        }

        let total = changeset.line_count();
        if total > self.config.max_lines {
            return Err(ChangesetError::OversizedInput {
                lines: total,
                max: self.config.max_lines,
            });
        }

        let alignment = align::align(&changeset.old_lines, &changeset.new_lines);
        let hunks = normalize::normalize(&alignment, &changeset, self.config.context_lines);

        let language = request
            .language_hint
            .clone()
            .or_else(|| detect_language(&changeset.path));
        let cache = HighlightCache::with_capacity(total);
        let session = classify::ClassifySession::new(
            &self.config,
            self.highlighter.as_ref(),
            &cache,
            language.as_deref(),
            &alignment,
            &changeset,
        );
        let classified: Vec<Vec<RenderRow>> = hunks
            .hunks
            .iter()
            .map(|hunk| session.classify_hunk(hunk, &alignment, &changeset))
            .collect();

        let comments = match self.comments.load_comments(&changeset.id) {
            Ok(comments) => comments,
            Err(err) => {
                log::warn!("Comment store failed for {}: {err:#}", changeset.id);
                Vec::new()
            }
        };
        let anchored = anchor::anchor(&comments, &changeset, self.config.anchor_window);

        let rows = build::build(&hunks, classified, anchored, &changeset)?;
        let stats = stats_from_alignment(&alignment);

        let parsed = ParsedChangeset {
            changeset,
            rows,
            stats,
            hunks,
            alignment,
            language,
            cache,
            highlighter: Arc::clone(&self.highlighter),
        };
        self.notify(&parsed);
        Ok(parsed)
    }

    fn binary_result(&self, changeset: Changeset) -> ParsedChangeset {
        let label = self
            .attachments
            .binary_placeholder(&changeset.path)
            .unwrap_or_else(|| format!("Binary file {} differs", changeset.path));
        let rows = vec![RenderRow::marker(RowKind::BinaryPlaceholder { label })];

        let parsed = ParsedChangeset {
            changeset,
            rows,
            stats: DiffStats::default(),
            hunks: HunkSet::default(),
            alignment: Vec::new(),
            language: None,
            cache: HighlightCache::new(),
            highlighter: Arc::clone(&self.highlighter),
        };
        self.notify(&parsed);
        parsed
    }

    fn notify(&self, parsed: &ParsedChangeset) {
        let event = ChangesetParsed {
            changeset_id: parsed.changeset.id.clone(),
            path: parsed.changeset.path.clone(),
            additions: parsed.stats.additions,
            deletions: parsed.stats.deletions,
            row_count: parsed.rows.len(),
        };
        self.events.changeset_parsed(&event);
    }
}

fn stats_from_alignment(alignment: &[AlignmentEntry]) -> DiffStats {
    let mut stats = DiffStats::default();
    for entry in alignment {
        match entry.kind {
            AlignmentKind::Add => stats.additions += 1,
            AlignmentKind::Remove => stats.deletions += 1,
            AlignmentKind::Equal => {}
        }
    }
    stats
}
