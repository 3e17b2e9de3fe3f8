use serde::Serialize;

/// Emitted after a changeset parse completes, for downstream indexing.
#[derive(Debug, Clone, Serialize)]
pub struct ChangesetParsed {
    pub changeset_id: String,
    pub path: String,
    pub additions: u32,
    pub deletions: u32,
    pub row_count: usize,
}

/// Fire-and-forget notification seam.
///
/// Not required for correctness of the core; implementations must swallow
/// their own failures (the pipeline never inspects an outcome).
pub trait EventBus: Send + Sync {
    fn changeset_parsed(&self, event: &ChangesetParsed);
}

/// Bus that drops every event.
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn changeset_parsed(&self, _event: &ChangesetParsed) {}
}
