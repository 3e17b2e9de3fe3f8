use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::InlineComment;

/// Read-only view onto wherever inline comments are persisted.
///
/// The core never writes back through this seam; re-anchoring produces a
/// view, not a mutation.
pub trait CommentStore: Send + Sync {
    fn load_comments(&self, changeset_id: &str) -> Result<Vec<InlineComment>>;
}

/// In-memory comment store for tests and embeddings without persistence.
#[derive(Default)]
pub struct MemoryCommentStore {
    comments: Mutex<HashMap<String, Vec<InlineComment>>>,
}

impl MemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, changeset_id: impl Into<String>, comment: InlineComment) {
        self.comments
            .lock()
            .unwrap()
            .entry(changeset_id.into())
            .or_default()
            .push(comment);
    }
}

impl CommentStore for MemoryCommentStore {
    fn load_comments(&self, changeset_id: &str) -> Result<Vec<InlineComment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(changeset_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommentSide;

    #[test]
    fn returns_comments_in_insertion_order() {
        let store = MemoryCommentStore::new();
        store.insert(
            "cs1",
            InlineComment::new(CommentSide::New, 3, "line three", "first", "reviewer"),
        );
        store.insert(
            "cs1",
            InlineComment::new(CommentSide::New, 8, "line eight", "second", "reviewer"),
        );

        let loaded = store.load_comments("cs1").unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].body, "first");
        assert!(store.load_comments("other").unwrap().is_empty());
    }
}
