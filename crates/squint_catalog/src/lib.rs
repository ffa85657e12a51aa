//! Catalog extensions supply schema metadata (tables, columns, functions)
//! for aliased namespaces. Table metadata is expensive to fetch, so it flows
//! through [`MetadataCache`]: an asynchronous, TTL-keyed cache that never
//! blocks the caller and reports progress over an [`EventBus`].

mod cache;
mod events;
mod extension;
mod meta;

pub use cache::{DEFAULT_METADATA_TTL, MetadataCache};
pub use events::{EventBus, NoopEventBus, TaskEvent};
pub use extension::{CatalogExtension, SchemaMetadataProvider, SessionState};
pub use meta::{ColumnMeta, FunctionKind, FunctionMeta, TableMeta, contains_suffix};

/// Failure of a schema metadata provider. Caught at the cache-loader
/// boundary; never fatal to the editing session.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata provider is unavailable: {0}")]
    Unavailable(String),
    #[error("metadata fetch failed: {0}")]
    Fetch(String),
}
