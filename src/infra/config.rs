use serde::{Deserialize, Serialize};

/// Policy constants for the changeset pipeline.
///
/// All of these are tunable per parse session; the defaults below are the
/// values the surrounding application ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangesetConfig {
    /// Unchanged lines kept on each flank of a hunk.
    pub context_lines: usize,
    /// Minimum `similar` ratio for a remove/add pair to render as one
    /// modify row with intraline highlighting. Below it the lines are
    /// treated as unrelated and character-level churn is not shown.
    pub similarity_threshold: f32,
    /// Lines longer than this are never intraline-diffed.
    pub max_intraline_len: usize,
    /// How far (in line numbers, each direction) comment anchoring searches
    /// for a matching fingerprint after the stored position went stale.
    pub anchor_window: u32,
    /// Hard cap on materialized line count, enforced before alignment.
    pub max_lines: usize,
    /// Lines with fewer significant characters than this are exempt from
    /// move/copy detection; braces and blanks would otherwise "move"
    /// everywhere.
    pub move_detect_min_len: usize,
}

impl Default for ChangesetConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            similarity_threshold: 0.3,
            max_intraline_len: 600,
            anchor_window: 20,
            max_lines: 100_000,
            move_detect_min_len: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: ChangesetConfig = serde_json::from_str(r#"{"context_lines": 5}"#).unwrap();
        assert_eq!(config.context_lines, 5);
        assert_eq!(config.anchor_window, 20);
    }
}
