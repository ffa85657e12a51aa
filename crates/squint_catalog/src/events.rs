/// Progress notifications bracketing a background metadata load. Published
/// fire-and-forget; no acknowledgement is expected, and the (catalog, key)
/// pair lets a UI offer a cancel/refresh affordance via
/// [`crate::MetadataCache::invalidate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started {
        catalog: String,
        key: String,
        label: String,
    },
    Completed {
        catalog: String,
        key: String,
        /// Failure cause, if the load failed.
        error: Option<String>,
    },
}

pub trait EventBus: Send + Sync {
    fn publish(&self, event: TaskEvent);
}

/// Bus for hosts without a progress UI.
#[derive(Debug, Default)]
pub struct NoopEventBus;

impl EventBus for NoopEventBus {
    fn publish(&self, _event: TaskEvent) {}
}
