use similar::{Algorithm, DiffOp, capture_diff_slices};

use crate::domain::{AlignmentEntry, SourceLine};

/// Aligns the old and new line sequences into an ordered entry list.
///
/// Wraps the LCS diff primitive over exact line-text equality. Myers yields
/// the conventional delete-before-insert ordering for ambiguous regions, so
/// the output matches what unified-diff output would show. Every input line
/// lands in exactly one entry; pairing similar remove/add runs into modify
/// rows happens later, in the classifier.
pub fn align(old: &[SourceLine], new: &[SourceLine]) -> Vec<AlignmentEntry> {
    let old_texts: Vec<&str> = old.iter().map(|l| l.text.as_str()).collect();
    let new_texts: Vec<&str> = new.iter().map(|l| l.text.as_str()).collect();

    let mut entries = Vec::with_capacity(old.len().max(new.len()));
    for op in capture_diff_slices(Algorithm::Myers, &old_texts, &new_texts) {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => {
                for k in 0..len {
                    entries.push(AlignmentEntry::equal(old_index + k, new_index + k));
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                for k in 0..old_len {
                    entries.push(AlignmentEntry::remove(old_index + k));
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for k in 0..new_len {
                    entries.push(AlignmentEntry::add(new_index + k));
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                for k in 0..old_len {
                    entries.push(AlignmentEntry::remove(old_index + k));
                }
                for k in 0..new_len {
                    entries.push(AlignmentEntry::add(new_index + k));
                }
            }
        }
    }

    entries
}
