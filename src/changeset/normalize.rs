use crate::domain::{AlignmentEntry, Changeset, CollapsedGap, Hunk, HunkSet};

/// Converts the alignment into hunks bounded by context, collapsing long
/// unchanged runs into gap markers.
///
/// Two things produce gaps: an EQUAL run longer than the kept context
/// (materialized gap, expandable later), and a line-number discontinuity
/// between adjacent entries (hunk-only input where the unchanged middle of
/// the file was never materialized). An interior EQUAL run of length up to
/// `2 × context_lines` stays fully expanded so near-adjacent changes merge
/// into one hunk instead of toggling a useless collapse marker.
pub fn normalize(
    alignment: &[AlignmentEntry],
    changeset: &Changeset,
    context_lines: usize,
) -> HunkSet {
    let n = alignment.len();
    let mut set = HunkSet::default();
    if n == 0 {
        return set;
    }

    // Pass 1: gaps from line-number discontinuities.
    let mut boundary_before = vec![false; n + 1];
    let mut prev_old: Option<u32> = None;
    let mut prev_new: Option<u32> = None;
    for (i, entry) in alignment.iter().enumerate() {
        let cur_old = entry.old.and_then(|idx| changeset.old_line(idx)).map(|l| l.number);
        let cur_new = entry.new.and_then(|idx| changeset.new_line(idx)).map(|l| l.number);

        let hidden_old = hidden_between(prev_old, cur_old);
        let hidden_new = hidden_between(prev_new, cur_new);
        let hidden = hidden_old.max(hidden_new);
        if hidden > 0 {
            boundary_before[i] = true;
            set.gaps.push(CollapsedGap {
                entries: i..i,
                hidden: hidden as usize,
                old_range: range_between(prev_old, cur_old),
                new_range: range_between(prev_new, cur_new),
            });
        }

        if cur_old.is_some() {
            prev_old = cur_old;
        }
        if cur_new.is_some() {
            prev_new = cur_new;
        }
    }

    // Pass 2: collapse long EQUAL runs.
    let changed: Vec<bool> = alignment.iter().map(|e| e.is_change()).collect();
    let mut collapsed = vec![false; n];
    let mut run_start = 0usize;
    for i in 0..=n {
        let breaks_run = i == n || changed[i] || boundary_before[i];
        if !breaks_run {
            continue;
        }
        if run_start < i {
            collapse_run(
                alignment,
                changeset,
                &changed,
                &boundary_before,
                run_start..i,
                context_lines,
                &mut collapsed,
                &mut set.gaps,
            );
        }
        run_start = if i < n && changed[i] { i + 1 } else { i };
    }

    // Pass 3: hunks are the maximal uncollapsed runs, split at gaps.
    let mut hunk_start: Option<usize> = None;
    for i in 0..=n {
        let closes = i == n || collapsed[i] || (boundary_before[i] && hunk_start.is_some());
        if closes {
            if let Some(start) = hunk_start.take() {
                if i > start {
                    set.hunks.push(make_hunk(alignment, start..i));
                }
            }
        }
        if i < n && !collapsed[i] && hunk_start.is_none() {
            hunk_start = Some(i);
        }
    }

    // Zero-width gaps sort before materialized ones at the same position.
    set.gaps
        .sort_by_key(|g| (g.entries.start, g.is_materialized() as u8));
    set
}

fn hidden_between(prev: Option<u32>, cur: Option<u32>) -> u32 {
    match (prev, cur) {
        (Some(p), Some(c)) if c > p + 1 => c - p - 1,
        // Hunk input starting mid-file: everything before the first
        // materialized line is hidden.
        (None, Some(c)) if c > 1 => c - 1,
        _ => 0,
    }
}

fn range_between(prev: Option<u32>, cur: Option<u32>) -> Option<(u32, u32)> {
    match (prev, cur) {
        (Some(p), Some(c)) if c > p + 1 => Some((p + 1, c - 1)),
        (None, Some(c)) if c > 1 => Some((1, c - 1)),
        _ => None,
    }
}

#[allow(clippy::too_many_arguments)]
fn collapse_run(
    alignment: &[AlignmentEntry],
    changeset: &Changeset,
    changed: &[bool],
    boundary_before: &[bool],
    run: std::ops::Range<usize>,
    context_lines: usize,
    collapsed: &mut [bool],
    gaps: &mut Vec<CollapsedGap>,
) {
    let n = alignment.len();
    // Context is only owed toward an adjacent change in the same region; a
    // flank that faces the file edge or an existing gap keeps nothing.
    let keep_left = if run.start > 0 && !boundary_before[run.start] && changed[run.start - 1] {
        context_lines
    } else {
        0
    };
    let keep_right = if run.end < n && !boundary_before[run.end] && changed[run.end] {
        context_lines
    } else {
        0
    };

    if run.len() <= keep_left + keep_right {
        return;
    }

    let hidden = (run.start + keep_left)..(run.end - keep_right);
    for idx in hidden.clone() {
        collapsed[idx] = true;
    }

    let first = &alignment[hidden.start];
    let last = &alignment[hidden.end - 1];
    gaps.push(CollapsedGap {
        hidden: hidden.len(),
        old_range: line_number_range(changeset, first.old, last.old, Side::Old),
        new_range: line_number_range(changeset, first.new, last.new, Side::New),
        entries: hidden,
    });
}

enum Side {
    Old,
    New,
}

fn line_number_range(
    changeset: &Changeset,
    first: Option<usize>,
    last: Option<usize>,
    side: Side,
) -> Option<(u32, u32)> {
    let number = |idx: usize| match side {
        Side::Old => changeset.old_line(idx).map(|l| l.number),
        Side::New => changeset.new_line(idx).map(|l| l.number),
    };
    Some((number(first?)?, number(last?)?))
}

fn make_hunk(alignment: &[AlignmentEntry], entries: std::ops::Range<usize>) -> Hunk {
    let slice = &alignment[entries.clone()];
    let context_before = slice.iter().take_while(|e| !e.is_change()).count();
    let context_after = if context_before == slice.len() {
        0
    } else {
        slice.iter().rev().take_while(|e| !e.is_change()).count()
    };
    Hunk {
        entries,
        context_before,
        context_after,
    }
}
