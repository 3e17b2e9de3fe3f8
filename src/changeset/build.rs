use crate::domain::{
    AnchoredComment, Changeset, ChangesetError, CommentSide, HunkSet, RenderRow, RowKind, Segment,
};

/// Merges gap markers, classified hunk rows and anchored comments into the
/// final linear row sequence.
///
/// Purely a merge/flatten step: no allocation beyond the output, no policy.
/// `classified` must hold one row group per hunk, in hunk order. Structural
/// inconsistency between the inputs is an internal invariant violation and
/// fails with [`ChangesetError::Inconsistent`].
pub fn build(
    hunk_set: &HunkSet,
    classified: Vec<Vec<RenderRow>>,
    anchored: Vec<AnchoredComment>,
    changeset: &Changeset,
) -> Result<Vec<RenderRow>, ChangesetError> {
    let mut rows = Vec::new();
    let mut groups = classified.into_iter();

    for segment in hunk_set.segments() {
        match segment {
            Segment::Gap(gap) => {
                rows.push(RenderRow::marker(RowKind::CollapsedGap {
                    hidden: gap.hidden,
                    old_range: gap.old_range,
                    new_range: gap.new_range,
                }));
            }
            Segment::Hunk(_) => {
                let group = groups.next().ok_or_else(|| {
                    ChangesetError::Inconsistent(
                        "fewer classified row groups than hunks".to_string(),
                    )
                })?;
                rows.extend(group);
            }
        }
    }
    if groups.next().is_some() {
        return Err(ChangesetError::Inconsistent(
            "more classified row groups than hunks".to_string(),
        ));
    }

    for row in &rows {
        if let Some(idx) = row.old {
            if idx >= changeset.old_lines.len() {
                return Err(ChangesetError::Inconsistent(format!(
                    "row references old line index {idx} beyond {}",
                    changeset.old_lines.len()
                )));
            }
        }
        if let Some(idx) = row.new {
            if idx >= changeset.new_lines.len() {
                return Err(ChangesetError::Inconsistent(format!(
                    "row references new line index {idx} beyond {}",
                    changeset.new_lines.len()
                )));
            }
        }
    }

    attach_comments(&mut rows, anchored, changeset);
    Ok(rows)
}

/// Attaches each resolved comment to the row carrying its line; comments
/// resolved into a collapsed region land on the gap marker instead. Whatever
/// cannot be placed (orphans included) ends up on one trailing thread row so
/// nothing is dropped silently.
fn attach_comments(rows: &mut Vec<RenderRow>, anchored: Vec<AnchoredComment>, changeset: &Changeset) {
    let mut trailing: Vec<AnchoredComment> = Vec::new();

    for entry in anchored {
        let Some(line_no) = entry.resolved_line else {
            trailing.push(entry);
            continue;
        };
        let side = entry.comment.side;

        if let Some(pos) = find_line_row(rows, changeset, side, line_no) {
            rows[pos].comments.push(entry);
        } else if let Some(pos) = find_gap_row(rows, side, line_no) {
            rows[pos].comments.push(entry);
        } else {
            trailing.push(entry);
        }
    }

    if !trailing.is_empty() {
        let mut thread = RenderRow::marker(RowKind::CommentThread);
        thread.comments = trailing;
        rows.push(thread);
    }
}

fn find_line_row(
    rows: &[RenderRow],
    changeset: &Changeset,
    side: CommentSide,
    line_no: u32,
) -> Option<usize> {
    rows.iter().position(|row| {
        let number = match side {
            CommentSide::Old => row.old.and_then(|idx| changeset.old_line(idx)).map(|l| l.number),
            CommentSide::New => row.new.and_then(|idx| changeset.new_line(idx)).map(|l| l.number),
        };
        number == Some(line_no)
    })
}

fn find_gap_row(rows: &[RenderRow], side: CommentSide, line_no: u32) -> Option<usize> {
    rows.iter().position(|row| match &row.kind {
        RowKind::CollapsedGap {
            old_range,
            new_range,
            ..
        } => {
            let range = match side {
                CommentSide::Old => *old_range,
                CommentSide::New => *new_range,
            };
            range.is_some_and(|(start, end)| (start..=end).contains(&line_no))
        }
        _ => false,
    })
}
