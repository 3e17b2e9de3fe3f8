use unidiff::PatchSet;

use crate::domain::{Changeset, ChangesetError, FileChange, SourceLine};

const DEV_NULL: &str = "/dev/null";

/// Builds a changeset from unified-diff text for one file revision.
///
/// `path_hint` selects the matching file section when the diff carries more
/// than one; otherwise the first section is taken. Binary diffs
/// short-circuit to an empty changeset flagged [`FileChange::Binary`].
pub fn from_unified_diff(
    id: &str,
    path_hint: Option<&str>,
    diff_text: &str,
) -> Result<Changeset, ChangesetError> {
    let trimmed = diff_text.trim();
    if trimmed.is_empty() {
        return Err(ChangesetError::MalformedHunkHeader(
            "empty diff text".to_string(),
        ));
    }

    if let Some(path) = binary_diff_path(trimmed) {
        return Ok(Changeset {
            id: id.to_string(),
            path: path_hint.map(str::to_string).unwrap_or(path),
            file_change: FileChange::Binary,
            old_lines: Vec::new(),
            new_lines: Vec::new(),
        });
    }

    validate_hunks(trimmed)?;

    let mut patch = PatchSet::new();
    patch
        .parse(trimmed)
        .map_err(|err| ChangesetError::MalformedHunkHeader(err.to_string()))?;

    let files = patch.files();
    if files.is_empty() {
        return Err(ChangesetError::MalformedHunkHeader(
            "no file sections in diff".to_string(),
        ));
    }

    let file = match path_hint {
        Some(hint) => files
            .iter()
            .find(|f| {
                strip_git_prefix(&f.target_file) == hint || strip_git_prefix(&f.source_file) == hint
            })
            .unwrap_or(&files[0]),
        None => &files[0],
    };
    if files.len() > 1 {
        log::debug!(
            "Diff contains {} file sections, parsing {}",
            files.len(),
            file.target_file
        );
    }

    let mut old_lines = Vec::new();
    let mut new_lines = Vec::new();
    for hunk in file.hunks() {
        for line in hunk.lines() {
            if line.is_context() || line.is_removed() {
                if let Some(number) = line.source_line_no {
                    old_lines.push(SourceLine::new(number as u32, line.value.as_str()));
                }
            }
            if line.is_context() || line.is_added() {
                if let Some(number) = line.target_line_no {
                    new_lines.push(SourceLine::new(number as u32, line.value.as_str()));
                }
            }
        }
    }

    let source = strip_git_prefix(&file.source_file);
    let target = strip_git_prefix(&file.target_file);
    let (path, file_change) = if source == DEV_NULL {
        (target, FileChange::Added)
    } else if target == DEV_NULL {
        (source, FileChange::Deleted)
    } else if source != target {
        (target, FileChange::Renamed { from: source })
    } else {
        (target, FileChange::Modified)
    };

    Ok(Changeset {
        id: id.to_string(),
        path,
        file_change,
        old_lines,
        new_lines,
    })
}

/// Validates every `@@` header and its body before the real parse, so a
/// count mismatch surfaces as [`ChangesetError::LineCountMismatch`] instead
/// of whatever the parser library stumbles over downstream.
fn validate_hunks(diff_text: &str) -> Result<(), ChangesetError> {
    let lines: Vec<&str> = diff_text.lines().collect();
    let mut hunk_idx = 0usize;
    let mut i = 0usize;

    while i < lines.len() {
        let line = lines[i];
        if !line.starts_with("@@") {
            i += 1;
            continue;
        }

        let (_, source_len, _, target_len) = parse_hunk_header(line)
            .ok_or_else(|| ChangesetError::MalformedHunkHeader(line.to_string()))?;

        let mut source_actual = 0usize;
        let mut target_actual = 0usize;
        i += 1;
        while i < lines.len() {
            let body = lines[i];
            if body.starts_with("@@")
                || body.starts_with("diff ")
                || body.starts_with("--- ")
                || body.starts_with("+++ ")
            {
                break;
            }
            if body.starts_with('+') {
                target_actual += 1;
            } else if body.starts_with('-') {
                source_actual += 1;
            } else if body.starts_with('\\') {
                // "\ No newline at end of file" belongs to neither side.
            } else {
                source_actual += 1;
                target_actual += 1;
            }
            i += 1;
        }

        if source_actual != source_len {
            return Err(ChangesetError::LineCountMismatch {
                hunk: hunk_idx,
                side: "source",
                expected: source_len,
                actual: source_actual,
            });
        }
        if target_actual != target_len {
            return Err(ChangesetError::LineCountMismatch {
                hunk: hunk_idx,
                side: "target",
                expected: target_len,
                actual: target_actual,
            });
        }
        hunk_idx += 1;
    }

    Ok(())
}

/// Parses `@@ -old_start,old_len +new_start,new_len @@` strictly; a length
/// of 1 may be omitted per the unified-diff format.
fn parse_hunk_header(header: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = header.strip_prefix("@@ ")?;
    let (meta, _) = rest.split_once(" @@")?;
    let mut parts = meta.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    if parts.next().is_some() {
        return None;
    }
    let (old_start, old_len) = parse_range(old)?;
    let (new_start, new_len) = parse_range(new)?;
    Some((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn strip_git_prefix(path: &str) -> String {
    path.trim_start_matches("a/")
        .trim_start_matches("b/")
        .to_string()
}

/// Detects the "Binary files ... differ" marker and extracts the path.
fn binary_diff_path(diff_text: &str) -> Option<String> {
    for line in diff_text.lines() {
        if line.starts_with("Binary files ") && line.ends_with(" differ") {
            let middle = &line["Binary files ".len()..line.len() - " differ".len()];
            let path = middle
                .rsplit(" and ")
                .next()
                .map(strip_git_prefix)
                .unwrap_or_default();
            return Some(path);
        }
        if line.starts_with("GIT binary patch") {
            return Some(String::new());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DIFF: &str = "\
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,3 +1,4 @@
 fn alpha() {}
-fn beta() {}
+fn beta(x: u32) {}
 fn gamma() {}
+fn delta() {}
";

    #[test]
    fn parses_lines_with_real_numbers() {
        let cs = from_unified_diff("cs", None, SIMPLE_DIFF).unwrap();
        assert_eq!(cs.path, "src/lib.rs");
        assert_eq!(cs.file_change, FileChange::Modified);

        let old_numbers: Vec<u32> = cs.old_lines.iter().map(|l| l.number).collect();
        assert_eq!(old_numbers, vec![1, 2, 3]);
        let new_numbers: Vec<u32> = cs.new_lines.iter().map(|l| l.number).collect();
        assert_eq!(new_numbers, vec![1, 2, 3, 4]);
        assert_eq!(cs.new_lines[1].text, "fn beta(x: u32) {}");
    }

    #[test]
    fn empty_input_is_malformed() {
        let err = from_unified_diff("cs", None, "   \n").unwrap_err();
        assert!(matches!(err, ChangesetError::MalformedHunkHeader(_)));
    }

    #[test]
    fn garbage_header_is_malformed() {
        let err = from_unified_diff("cs", None, "@@ this is not a header @@\n+x\n").unwrap_err();
        assert!(matches!(err, ChangesetError::MalformedHunkHeader(_)));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let diff = "\
--- a/f.txt
+++ b/f.txt
@@ -1,5 +1,2 @@
 one
-two
+deux
";
        let err = from_unified_diff("cs", None, diff).unwrap_err();
        assert!(matches!(
            err,
            ChangesetError::LineCountMismatch { side: "source", .. }
        ));
    }

    #[test]
    fn new_file_diff_is_added() {
        let diff = "\
--- /dev/null
+++ b/new.rs
@@ -0,0 +1,2 @@
+fn fresh() {}
+fn start() {}
";
        let cs = from_unified_diff("cs", None, diff).unwrap();
        assert_eq!(cs.file_change, FileChange::Added);
        assert_eq!(cs.path, "new.rs");
        assert!(cs.old_lines.is_empty());
        assert_eq!(cs.new_lines.len(), 2);
    }

    #[test]
    fn rename_is_detected_from_paths() {
        let diff = "\
--- a/before.rs
+++ b/after.rs
@@ -1,1 +1,1 @@
-old
+new
";
        let cs = from_unified_diff("cs", None, diff).unwrap();
        assert_eq!(cs.path, "after.rs");
        assert_eq!(
            cs.file_change,
            FileChange::Renamed {
                from: "before.rs".to_string()
            }
        );
    }

    #[test]
    fn binary_marker_short_circuits() {
        let diff = "\
diff --git a/logo.png b/logo.png
Binary files a/logo.png and b/logo.png differ
";
        let cs = from_unified_diff("cs", None, diff).unwrap();
        assert!(cs.is_binary());
        assert_eq!(cs.path, "logo.png");
        assert!(cs.old_lines.is_empty() && cs.new_lines.is_empty());
    }
}
