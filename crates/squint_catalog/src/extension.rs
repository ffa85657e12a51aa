use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::MetadataError;
use crate::cache::DEFAULT_METADATA_TTL;
use crate::meta::{FunctionMeta, TableMeta};

/// Per-catalog configuration for the current editor session.
///
/// Providers read their connection/configuration properties through the
/// public accessors here; inline `use` directives in the document write
/// through them before completions are computed.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    properties: HashMap<String, HashMap<String, String>>,
}

impl SessionState {
    pub fn set_catalog_property(&mut self, catalog: &str, property: &str, value: impl Into<String>) {
        self.properties
            .entry(catalog.to_lowercase())
            .or_default()
            .insert(property.to_lowercase(), value.into());
    }

    pub fn catalog_property(&self, catalog: &str, property: &str) -> Option<&str> {
        self.properties
            .get(&catalog.to_lowercase())?
            .get(&property.to_lowercase())
            .map(String::as_str)
    }

    pub fn catalog_properties(&self, catalog: &str) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .get(&catalog.to_lowercase())
            .into_iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Source of schema metadata for one catalog. `fetch_tables` may be slow or
/// blocking; the engine always invokes it off the calling thread, through
/// the metadata cache.
pub trait SchemaMetadataProvider: Send + Sync {
    fn enabled(&self, session: &SessionState) -> bool {
        let _ = session;
        true
    }

    /// Cache key for the current provider state (e.g. a schema version
    /// token). `None` means the provider cannot serve metadata right now.
    fn cache_key(&self, session: &SessionState) -> Option<String>;

    fn fetch_tables(&self, session: &SessionState) -> Result<Vec<TableMeta>, MetadataError>;

    /// Human-readable label for progress reporting.
    fn describe(&self, session: &SessionState) -> String;

    fn ttl(&self) -> Duration {
        DEFAULT_METADATA_TTL
    }
}

/// A pluggable external data-source adapter exposing schema metadata for one
/// aliased namespace.
pub trait CatalogExtension: Send + Sync {
    fn alias(&self) -> &str;

    fn schema_metadata_provider(&self) -> Option<Arc<dyn SchemaMetadataProvider>>;

    /// Functions this catalog contributes. Function inventories are static
    /// per connector, so they are declared synchronously rather than cached.
    fn functions(&self, session: &SessionState) -> Vec<FunctionMeta> {
        let _ = session;
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState;

    #[test]
    fn properties_are_scoped_per_catalog() {
        let mut session = SessionState::default();
        session.set_catalog_property("hive", "scan_mode", "fast");
        session.set_catalog_property("iceberg", "scan_mode", "full");

        assert_eq!(session.catalog_property("hive", "scan_mode"), Some("fast"));
        assert_eq!(session.catalog_property("iceberg", "scan_mode"), Some("full"));
        assert_eq!(session.catalog_property("mysql", "scan_mode"), None);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut session = SessionState::default();
        session.set_catalog_property("Hive", "Scan_Mode", "fast");
        assert_eq!(session.catalog_property("hive", "scan_mode"), Some("fast"));
    }
}
