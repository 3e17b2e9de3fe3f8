/// Resolves binary and otherwise non-diffable files to a placeholder label.
///
/// A changeset flagged binary short-circuits line diffing entirely and
/// renders as a single placeholder row.
pub trait AttachmentResolver: Send + Sync {
    /// Label to display for `path` instead of a line-by-line diff, or `None`
    /// to fall back to a generic one.
    fn binary_placeholder(&self, path: &str) -> Option<String>;
}

/// Resolver that always falls back to the generic placeholder.
pub struct NoAttachments;

impl AttachmentResolver for NoAttachments {
    fn binary_placeholder(&self, _path: &str) -> Option<String> {
        None
    }
}
