//! Integration tests for the changeset pipeline.
//! These exercise the full parse → align → classify → anchor → build flow
//! the way an embedding application drives it.

use std::sync::{Arc, Mutex};

use lachangeset::domain::{CommentSide, InlineComment, RowKind, SpanSide};
use lachangeset::infra::config::ChangesetConfig;
use lachangeset::infra::events::{ChangesetParsed, EventBus};
use lachangeset::infra::store::MemoryCommentStore;
use lachangeset::{ChangesetParser, ChangesetRequest, ChangesetSource, ParsedChangeset};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse_contents(old: &str, new: &str) -> ParsedChangeset {
    init_logging();
    let parser = ChangesetParser::new(ChangesetConfig::default());
    parser
        .parse(&ChangesetRequest {
            id: "cs-test".to_string(),
            path: Some("src/sample.rs".to_string()),
            language_hint: None,
            source: ChangesetSource::FileContents { old, new },
        })
        .expect("parse succeeds")
}

/// Flattens the row sequence (expanding gaps) back into the old-order and
/// new-order line text sequences.
fn flatten(parsed: &ParsedChangeset) -> (Vec<String>, Vec<String>) {
    let mut old = Vec::new();
    let mut new = Vec::new();

    let mut collect = |row: &lachangeset::domain::RenderRow| {
        if let Some(line) = parsed.old_line(row) {
            old.push(line.text.clone());
        }
        if let Some(line) = parsed.new_line(row) {
            new.push(line.text.clone());
        }
    };

    for (idx, row) in parsed.rows.iter().enumerate() {
        match &row.kind {
            RowKind::CollapsedGap { .. } => {
                for hidden in parsed.expand_gap(idx).expect("materialized gap") {
                    collect(&hidden);
                }
            }
            RowKind::CommentThread | RowKind::BinaryPlaceholder { .. } => {}
            _ => collect(row),
        }
    }

    (old, new)
}

#[test]
fn test_round_trip_reproduces_both_line_sequences() {
    let old: String = (1..=50).map(|i| format!("line number {i}\n")).collect();
    let new = old
        .replace("line number 7\n", "line number seven\n")
        .replace("line number 33\n", "")
        .replace("line number 41\n", "line number 41\nline number 41.5\n");

    let parsed = parse_contents(&old, &new);
    let (flat_old, flat_new) = flatten(&parsed);

    let expect_old: Vec<String> = old.lines().map(str::to_string).collect();
    let expect_new: Vec<String> = new.lines().map(str::to_string).collect();
    assert_eq!(flat_old, expect_old);
    assert_eq!(flat_new, expect_new);
}

#[test]
fn test_identical_files_collapse_to_one_gap() {
    let text: String = (1..=25).map(|i| format!("same {i}\n")).collect();
    let parsed = parse_contents(&text, &text);

    assert_eq!(parsed.stats.additions, 0);
    assert_eq!(parsed.stats.deletions, 0);
    assert!(parsed.rows.iter().all(|r| !r.is_change()));
    assert_eq!(parsed.rows.len(), 1);
    assert!(matches!(
        parsed.rows[0].kind,
        RowKind::CollapsedGap { hidden: 25, .. }
    ));
}

#[test]
fn test_parse_is_deterministic() {
    let old = "alpha\nbeta\ngamma\n";
    let new = "alpha\nbeta two\ngamma\ndelta\n";
    let first = parse_contents(old, new);
    let second = parse_contents(old, new);

    assert_eq!(first.alignment, second.alignment);
    assert_eq!(first.rows, second.rows);
}

#[test]
fn test_unified_diff_round_trips_through_pipeline() {
    init_logging();
    let diff = "\
--- a/src/config.rs
+++ b/src/config.rs
@@ -8,6 +8,6 @@
 fn defaults() {
     let retries = 3;
-    let timeout = 30;
+    let timeout = 60;
     let verbose = false;
 }
 struct Config;
@@ -40,4 +40,5 @@
 fn load() {
     read_file();
     apply_env();
+    validate();
 }
";
    let parser = ChangesetParser::new(ChangesetConfig::default());
    let parsed = parser
        .parse(&ChangesetRequest {
            id: "cs-diff".to_string(),
            path: None,
            language_hint: None,
            source: ChangesetSource::UnifiedDiff { text: diff },
        })
        .expect("diff parses");

    assert_eq!(parsed.changeset.path, "src/config.rs");
    assert_eq!(parsed.stats.additions, 2);
    assert_eq!(parsed.stats.deletions, 1);

    // The timeout change is similar enough to pair into one modify row.
    let modify = parsed
        .rows
        .iter()
        .find(|r| r.kind == RowKind::Modify)
        .expect("modify row present");
    assert!(modify.intraline.iter().any(|s| s.side == SpanSide::Old));
    assert!(modify.intraline.iter().any(|s| s.side == SpanSide::New));

    // The unmaterialized middle of the file shows up as a gap marker
    // between the two hunks, carrying the hidden line-number range; the
    // lines before the first hunk get one too.
    let gap = parsed
        .rows
        .iter()
        .find(|r| {
            matches!(
                r.kind,
                RowKind::CollapsedGap {
                    old_range: Some((14, 39)),
                    ..
                }
            )
        })
        .expect("gap between hunks");
    assert!(matches!(gap.kind, RowKind::CollapsedGap { hidden: 26, .. }));
    assert!(parsed.rows.iter().any(|r| matches!(
        r.kind,
        RowKind::CollapsedGap {
            old_range: Some((1, 7)),
            ..
        }
    )));
}

#[test]
fn test_comment_survives_insertion_above() {
    init_logging();
    let old: String = (1..=20).map(|i| format!("body {i}\n")).collect();
    // Five unrelated lines inserted at the top shift everything down.
    let mut new = String::new();
    for i in 1..=5 {
        new.push_str(&format!("inserted {i}\n"));
    }
    new.push_str(&old);

    let store = Arc::new(MemoryCommentStore::new());
    store.insert(
        "cs-anchor",
        InlineComment::new(CommentSide::New, 10, "body 10", "watch this loop", "dana"),
    );

    let parser =
        ChangesetParser::new(ChangesetConfig::default()).with_comment_store(store.clone());
    let parsed = parser
        .parse(&ChangesetRequest {
            id: "cs-anchor".to_string(),
            path: Some("notes.txt".to_string()),
            language_hint: None,
            source: ChangesetSource::FileContents {
                old: &old,
                new: &new,
            },
        })
        .expect("parse succeeds");

    let carrier = parsed
        .rows
        .iter()
        .find(|r| !r.comments.is_empty())
        .expect("comment attached somewhere");
    let anchored = &carrier.comments[0];
    assert!(!anchored.orphaned);
    assert_eq!(anchored.resolved_line, Some(15));
}

#[test]
fn test_orphaned_comment_is_returned_not_dropped() {
    init_logging();
    let store = Arc::new(MemoryCommentStore::new());
    store.insert(
        "cs-orphan",
        InlineComment::new(CommentSide::New, 2, "text that was deleted", "stale", "dana"),
    );

    let parser = ChangesetParser::new(ChangesetConfig::default()).with_comment_store(store);
    let parsed = parser
        .parse(&ChangesetRequest {
            id: "cs-orphan".to_string(),
            path: Some("notes.txt".to_string()),
            language_hint: None,
            source: ChangesetSource::FileContents {
                old: "alpha\nbeta\n",
                new: "alpha\ngamma\n",
            },
        })
        .expect("parse succeeds");

    let thread = parsed.rows.last().expect("rows present");
    assert_eq!(thread.kind, RowKind::CommentThread);
    assert_eq!(thread.comments.len(), 1);
    assert!(thread.comments[0].orphaned);
    assert_eq!(thread.comments[0].comment.body, "stale");
}

#[test]
fn test_unrelated_replacement_carries_no_intraline_spans() {
    let parsed = parse_contents(
        "zzzzzzzzzzzzzzzzzzzz\n",
        "#[derive(Debug, Clone)]\n",
    );

    assert!(parsed.rows.iter().all(|r| r.kind != RowKind::Modify));
    assert!(parsed.rows.iter().all(|r| r.intraline.is_empty()));
}

#[test]
fn test_binary_diff_renders_placeholder_row() {
    init_logging();
    let diff = "\
diff --git a/assets/icon.png b/assets/icon.png
Binary files a/assets/icon.png and b/assets/icon.png differ
";
    let parser = ChangesetParser::new(ChangesetConfig::default());
    let parsed = parser
        .parse(&ChangesetRequest {
            id: "cs-bin".to_string(),
            path: None,
            language_hint: None,
            source: ChangesetSource::UnifiedDiff { text: diff },
        })
        .expect("binary diff parses");

    assert!(parsed.changeset.is_binary());
    assert_eq!(parsed.rows.len(), 1);
    assert!(matches!(
        parsed.rows[0].kind,
        RowKind::BinaryPlaceholder { .. }
    ));
}

struct RecordingBus(Mutex<Vec<ChangesetParsed>>);

impl EventBus for RecordingBus {
    fn changeset_parsed(&self, event: &ChangesetParsed) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[test]
fn test_event_bus_is_notified_after_parse() {
    init_logging();
    let bus = Arc::new(RecordingBus(Mutex::new(Vec::new())));
    let parser = ChangesetParser::new(ChangesetConfig::default()).with_event_bus(bus.clone());

    parser
        .parse(&ChangesetRequest {
            id: "cs-bus".to_string(),
            path: Some("main.rs".to_string()),
            language_hint: None,
            source: ChangesetSource::FileContents {
                old: "a\n",
                new: "a\nb\n",
            },
        })
        .expect("parse succeeds");

    let events = bus.0.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].changeset_id, "cs-bus");
    assert_eq!(events[0].additions, 1);
    assert_eq!(events[0].deletions, 0);
}

#[test]
fn test_serialized_output_uses_stable_field_names() {
    let parsed = parse_contents("a\n", "a\nb\n");
    let json = serde_json::to_value(&parsed).expect("serializes");

    assert!(json.get("changeset").is_some());
    assert!(json.get("rows").is_some());
    assert!(json.get("stats").is_some());
    let rows = json["rows"].as_array().unwrap();
    assert!(rows
        .iter()
        .any(|r| r["kind"]["type"] == serde_json::json!("add")));
}
