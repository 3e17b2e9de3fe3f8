use similar::{ChangeTag, TextDiff};
use std::collections::HashSet;

use crate::domain::{
    AlignmentEntry, AlignmentKind, Changeset, Hunk, IntralineSpan, RenderRow, RowKind, SourceLine,
    SpanSide,
};
use crate::infra::config::ChangesetConfig;
use crate::infra::highlight::{HighlightCache, SyntaxHighlighter, highlight_with_cache};

/// Per-parse classification state: config, the caller-owned highlight cache
/// and the fingerprint indexes move/copy detection works from.
pub struct ClassifySession<'a> {
    config: &'a ChangesetConfig,
    highlighter: &'a dyn SyntaxHighlighter,
    cache: &'a HighlightCache,
    language: Option<&'a str>,
    removed: HashSet<u64>,
    added: HashSet<u64>,
    unchanged: HashSet<u64>,
}

impl<'a> ClassifySession<'a> {
    pub fn new(
        config: &'a ChangesetConfig,
        highlighter: &'a dyn SyntaxHighlighter,
        cache: &'a HighlightCache,
        language: Option<&'a str>,
        alignment: &[AlignmentEntry],
        changeset: &Changeset,
    ) -> Self {
        let mut removed = HashSet::new();
        let mut added = HashSet::new();
        let mut unchanged = HashSet::new();
        for entry in alignment {
            match entry.kind {
                AlignmentKind::Remove => {
                    if let Some(line) = entry.old.and_then(|idx| changeset.old_line(idx)) {
                        if significant(line, config.move_detect_min_len) {
                            removed.insert(line.fingerprint);
                        }
                    }
                }
                AlignmentKind::Add => {
                    if let Some(line) = entry.new.and_then(|idx| changeset.new_line(idx)) {
                        if significant(line, config.move_detect_min_len) {
                            added.insert(line.fingerprint);
                        }
                    }
                }
                AlignmentKind::Equal => {
                    if let Some(line) = entry.old.and_then(|idx| changeset.old_line(idx)) {
                        unchanged.insert(line.fingerprint);
                    }
                }
            }
        }

        Self {
            config,
            highlighter,
            cache,
            language,
            removed,
            added,
            unchanged,
        }
    }

    /// Classifies one hunk into render rows.
    ///
    /// A REMOVE run immediately followed by an ADD run of equal length is
    /// zipped pairwise; pairs similar enough become single MODIFY rows with
    /// intraline spans, the rest stay unrelated remove/add rows.
    pub fn classify_hunk(
        &self,
        hunk: &Hunk,
        alignment: &[AlignmentEntry],
        changeset: &Changeset,
    ) -> Vec<RenderRow> {
        let entries = &alignment[hunk.entries.clone()];
        let mut rows = Vec::with_capacity(entries.len());

        let mut i = 0usize;
        while i < entries.len() {
            let entry = entries[i];
            if entry.kind == AlignmentKind::Equal {
                if let Some(line) = entry.old.and_then(|idx| changeset.old_line(idx)) {
                    self.touch(line);
                }
                rows.push(RenderRow::line(RowKind::Unchanged, entry.old, entry.new));
                i += 1;
                continue;
            }

            let remove_start = i;
            while i < entries.len() && entries[i].kind == AlignmentKind::Remove {
                i += 1;
            }
            let insert_start = i;
            while i < entries.len() && entries[i].kind == AlignmentKind::Add {
                i += 1;
            }

            self.emit_change_run(
                &entries[remove_start..insert_start],
                &entries[insert_start..i],
                changeset,
                &mut rows,
            );
        }

        rows
    }

    fn emit_change_run(
        &self,
        removed: &[AlignmentEntry],
        added: &[AlignmentEntry],
        changeset: &Changeset,
        rows: &mut Vec<RenderRow>,
    ) {
        if !removed.is_empty() && !added.is_empty() && removed.len() == added.len() {
            let pairs: Vec<(&SourceLine, &SourceLine)> = removed
                .iter()
                .zip(added.iter())
                .filter_map(|(r, a)| {
                    let old = r.old.and_then(|idx| changeset.old_line(idx))?;
                    let new = a.new.and_then(|idx| changeset.new_line(idx))?;
                    Some((old, new))
                })
                .collect();

            let has_similar = pairs.iter().any(|(old, new)| self.is_similar(old, new));
            if has_similar && pairs.len() == removed.len() {
                for ((r, a), (old, new)) in removed.iter().zip(added.iter()).zip(&pairs) {
                    self.touch(old);
                    self.touch(new);
                    if self.is_similar(old, new) && self.within_intraline_cap(old, new) {
                        let mut row = RenderRow::line(RowKind::Modify, r.old, a.new);
                        row.intraline = intraline_spans(&old.text, &new.text);
                        rows.push(row);
                    } else {
                        rows.push(RenderRow::line(self.removed_kind(old), r.old, None));
                        rows.push(RenderRow::line(self.added_kind(new), None, a.new));
                    }
                }
                return;
            }
        }

        for entry in removed {
            if let Some(line) = entry.old.and_then(|idx| changeset.old_line(idx)) {
                self.touch(line);
                rows.push(RenderRow::line(self.removed_kind(line), entry.old, None));
            }
        }
        for entry in added {
            if let Some(line) = entry.new.and_then(|idx| changeset.new_line(idx)) {
                self.touch(line);
                rows.push(RenderRow::line(self.added_kind(line), None, entry.new));
            }
        }
    }

    fn is_similar(&self, old: &SourceLine, new: &SourceLine) -> bool {
        TextDiff::from_chars(old.text.as_str(), new.text.as_str()).ratio()
            > self.config.similarity_threshold
    }

    fn within_intraline_cap(&self, old: &SourceLine, new: &SourceLine) -> bool {
        old.text.len() <= self.config.max_intraline_len
            && new.text.len() <= self.config.max_intraline_len
    }

    fn removed_kind(&self, line: &SourceLine) -> RowKind {
        if significant(line, self.config.move_detect_min_len)
            && self.added.contains(&line.fingerprint)
        {
            RowKind::MoveAway
        } else {
            RowKind::Remove
        }
    }

    fn added_kind(&self, line: &SourceLine) -> RowKind {
        if significant(line, self.config.move_detect_min_len) {
            if self.removed.contains(&line.fingerprint) {
                return RowKind::MoveHere;
            }
            if self.unchanged.contains(&line.fingerprint) {
                return RowKind::Copy;
            }
        }
        RowKind::Add
    }

    /// Highlights a line through the session cache; at most one highlighter
    /// call per unique line text.
    fn touch(&self, line: &SourceLine) {
        highlight_with_cache(line, self.language, self.highlighter, self.cache);
    }
}

fn significant(line: &SourceLine, min_len: usize) -> bool {
    line.text.trim().len() >= min_len
}

/// Character-level changed regions for one modify pair, as byte-offset spans
/// on each side. Adjacent same-side spans are merged.
pub fn intraline_spans(old_text: &str, new_text: &str) -> Vec<IntralineSpan> {
    let diff = TextDiff::from_chars(old_text, new_text);
    let mut spans: Vec<IntralineSpan> = Vec::new();
    let mut old_off = 0usize;
    let mut new_off = 0usize;

    for change in diff.iter_all_changes() {
        let len = change.value().len();
        match change.tag() {
            ChangeTag::Equal => {
                old_off += len;
                new_off += len;
            }
            ChangeTag::Delete => {
                push_span(&mut spans, SpanSide::Old, old_off, old_off + len);
                old_off += len;
            }
            ChangeTag::Insert => {
                push_span(&mut spans, SpanSide::New, new_off, new_off + len);
                new_off += len;
            }
        }
    }

    spans
}

fn push_span(spans: &mut Vec<IntralineSpan>, side: SpanSide, start: usize, end: usize) {
    if let Some(last) = spans.iter_mut().rev().find(|s| s.side == side) {
        if last.end == start {
            last.end = end;
            return;
        }
    }
    spans.push(IntralineSpan { side, start, end });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::align::align;
    use crate::changeset::normalize::normalize;
    use crate::infra::highlight::SyntectHighlighter;

    fn classify_all(old: &str, new: &str, config: &ChangesetConfig) -> Vec<RenderRow> {
        let cs = Changeset::from_contents("cs", "file.rs", old, new);
        let alignment = align(&cs.old_lines, &cs.new_lines);
        let set = normalize(&alignment, &cs, config.context_lines);
        let highlighter = SyntectHighlighter::new();
        let cache = HighlightCache::new();
        let session =
            ClassifySession::new(config, &highlighter, &cache, Some("Rust"), &alignment, &cs);
        set.hunks
            .iter()
            .flat_map(|h| session.classify_hunk(h, &alignment, &cs))
            .collect()
    }

    #[test]
    fn similar_pair_becomes_modify_with_spans() {
        let config = ChangesetConfig::default();
        let rows = classify_all(
            "let count = compute_total(items);\n",
            "let count = compute_sum(items);\n",
            &config,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RowKind::Modify);
        assert!(!rows[0].intraline.is_empty());
        assert!(rows[0].intraline.iter().any(|s| s.side == SpanSide::Old));
        assert!(rows[0].intraline.iter().any(|s| s.side == SpanSide::New));
    }

    #[test]
    fn unrelated_pair_stays_remove_plus_add_without_spans() {
        let config = ChangesetConfig::default();
        let rows = classify_all(
            "zzzzzzzzzzzzzzzzzzzzzz\n",
            "#[derive(Debug, Clone)]\n",
            &config,
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, RowKind::Remove);
        assert_eq!(rows[1].kind, RowKind::Add);
        assert!(rows.iter().all(|r| r.intraline.is_empty()));
    }

    #[test]
    fn moved_line_is_classified_on_both_ends() {
        let config = ChangesetConfig::default();
        let old = "fn moved_helper() -> u32 { 42 }\nalpha\nbeta\ngamma\n";
        let new = "alpha\nbeta\ngamma\nfn moved_helper() -> u32 { 42 }\n";
        let rows = classify_all(old, new, &config);

        assert!(rows.iter().any(|r| r.kind == RowKind::MoveAway));
        assert!(rows.iter().any(|r| r.kind == RowKind::MoveHere));
    }

    #[test]
    fn short_lines_are_exempt_from_move_detection() {
        let config = ChangesetConfig::default();
        let old = "}\nalpha line one\nbeta line two\ngamma line three\n";
        let new = "alpha line one\nbeta line two\ngamma line three\n}\n";
        let rows = classify_all(old, new, &config);

        assert!(rows.iter().all(|r| r.kind != RowKind::MoveAway));
        assert!(rows.iter().all(|r| r.kind != RowKind::MoveHere));
    }

    #[test]
    fn copied_line_is_flagged() {
        let config = ChangesetConfig::default();
        let old = "const RETRY_LIMIT: u32 = 3;\nalpha\n";
        let new = "const RETRY_LIMIT: u32 = 3;\nalpha\nconst RETRY_LIMIT: u32 = 3;\n";
        let rows = classify_all(old, new, &config);

        assert!(rows.iter().any(|r| r.kind == RowKind::Copy));
    }

    #[test]
    fn intraline_spans_cover_only_changed_bytes() {
        let spans = intraline_spans("abcd", "abXd");
        assert_eq!(
            spans,
            vec![
                IntralineSpan {
                    side: SpanSide::Old,
                    start: 2,
                    end: 3
                },
                IntralineSpan {
                    side: SpanSide::New,
                    start: 2,
                    end: 3
                },
            ]
        );
    }

    #[test]
    fn intraline_spans_merge_adjacent_runs() {
        let spans = intraline_spans("aXYZb", "ab");
        assert_eq!(
            spans,
            vec![IntralineSpan {
                side: SpanSide::Old,
                start: 1,
                end: 4
            }]
        );
    }

    #[test]
    fn oversized_lines_skip_intraline_diffing() {
        let config = ChangesetConfig {
            max_intraline_len: 10,
            ..Default::default()
        };
        let rows = classify_all("abcdefghijklmnop one\n", "abcdefghijklmnop two\n", &config);

        // Similar but over the cap: split into remove/add without spans.
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.intraline.is_empty()));
    }
}
