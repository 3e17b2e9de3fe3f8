use crate::domain::{AnchoredComment, Changeset, CommentSide, InlineComment, SourceLine};

/// Re-anchors stored comments onto the current changeset.
///
/// Exact line-number match with a matching fingerprint resolves in place.
/// When the fingerprint at the stored position no longer matches (the file
/// was re-diffed and lines shifted), the nearest line with a matching
/// fingerprint within `window` line numbers wins, preferring the downward
/// candidate at equal distance since insertions above an anchor shift it
/// toward higher numbers. A comment with no match in the window comes back
/// flagged orphaned, never dropped.
pub fn anchor(
    comments: &[InlineComment],
    changeset: &Changeset,
    window: u32,
) -> Vec<AnchoredComment> {
    comments
        .iter()
        .map(|comment| anchor_one(comment, changeset, window))
        .collect()
}

fn anchor_one(comment: &InlineComment, changeset: &Changeset, window: u32) -> AnchoredComment {
    let lines: &[SourceLine] = match comment.side {
        CommentSide::Old => &changeset.old_lines,
        CommentSide::New => &changeset.new_lines,
    };

    // Lines are ordered by number; exact position first.
    if let Ok(idx) = lines.binary_search_by_key(&comment.line, |l| l.number) {
        if lines[idx].fingerprint == comment.anchor_fingerprint {
            return AnchoredComment::resolved(comment.clone(), lines[idx].number);
        }
    }

    let mut best: Option<&SourceLine> = None;
    for line in lines {
        let distance = line.number.abs_diff(comment.line);
        if distance > window || line.fingerprint != comment.anchor_fingerprint {
            continue;
        }
        best = match best {
            None => Some(line),
            Some(current) => {
                let current_distance = current.number.abs_diff(comment.line);
                if distance < current_distance
                    || (distance == current_distance && line.number > current.number)
                {
                    Some(line)
                } else {
                    Some(current)
                }
            }
        };
    }

    match best {
        Some(line) => AnchoredComment::resolved(comment.clone(), line.number),
        None => {
            log::debug!(
                "Comment {} lost its anchor at {} line {} of {}",
                comment.id,
                comment.side,
                comment.line,
                changeset.path
            );
            AnchoredComment::orphaned(comment.clone())
        }
    }
}
