//! Test doubles shared across the workspace's test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use squint_catalog::{
    CatalogExtension, ColumnMeta, EventBus, FunctionKind, FunctionMeta, MetadataError,
    SchemaMetadataProvider, SessionState, TableMeta, TaskEvent,
};
use text_size::TextSize;

/// Marker for the caret position inside a test query.
pub const CURSOR_POS: char = '€';

/// A query with an embedded caret marker: `"select * from €"`.
pub struct InputQuery {
    pub sql: String,
    pub position: usize,
}

impl From<&str> for InputQuery {
    fn from(value: &str) -> Self {
        let position = value
            .find(CURSOR_POS)
            .expect("Insert cursor position into your query.");

        InputQuery {
            sql: value.replace(CURSOR_POS, ""),
            position,
        }
    }
}

impl InputQuery {
    pub fn offset(&self) -> TextSize {
        TextSize::new(self.position as u32)
    }
}

/// Catalog extension backed by fixed, in-memory metadata. Delay and failure
/// injection make it usable for partial-result and error-path tests.
pub struct StaticCatalog {
    alias: String,
    tables: Vec<TableMeta>,
    functions: Vec<FunctionMeta>,
    cache_key: Option<String>,
    enabled: bool,
    ttl: Duration,
    load_delay: Duration,
    fail_with: Option<String>,
    load_count: Arc<AtomicUsize>,
}

impl StaticCatalog {
    pub fn new(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            tables: Vec::new(),
            functions: Vec::new(),
            cache_key: Some("v1".to_string()),
            enabled: true,
            ttl: Duration::from_secs(60),
            load_delay: Duration::ZERO,
            fail_with: None,
            load_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_table(mut self, name_parts: &[&str], columns: &[&str]) -> Self {
        self.tables.push(TableMeta {
            catalog: self.alias.clone(),
            name_parts: name_parts.iter().map(|p| p.to_string()).collect(),
            description: None,
            columns: columns
                .iter()
                .map(|c| ColumnMeta {
                    name: c.to_string(),
                    description: None,
                })
                .collect(),
        });
        self
    }

    pub fn with_function(mut self, name: &str, kind: FunctionKind) -> Self {
        self.functions.push(FunctionMeta {
            name: name.to_string(),
            kind,
            description: None,
        });
        self
    }

    pub fn with_cache_key(mut self, key: Option<&str>) -> Self {
        self.cache_key = key.map(str::to_string);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn load_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.load_count)
    }
}

impl CatalogExtension for StaticCatalog {
    fn alias(&self) -> &str {
        &self.alias
    }

    fn schema_metadata_provider(&self) -> Option<Arc<dyn SchemaMetadataProvider>> {
        Some(Arc::new(StaticProvider {
            alias: self.alias.clone(),
            tables: self.tables.clone(),
            cache_key: self.cache_key.clone(),
            enabled: self.enabled,
            ttl: self.ttl,
            load_delay: self.load_delay,
            fail_with: self.fail_with.clone(),
            load_count: Arc::clone(&self.load_count),
        }))
    }

    fn functions(&self, _session: &SessionState) -> Vec<FunctionMeta> {
        self.functions.clone()
    }
}

struct StaticProvider {
    alias: String,
    tables: Vec<TableMeta>,
    cache_key: Option<String>,
    enabled: bool,
    ttl: Duration,
    load_delay: Duration,
    fail_with: Option<String>,
    load_count: Arc<AtomicUsize>,
}

impl SchemaMetadataProvider for StaticProvider {
    fn enabled(&self, _session: &SessionState) -> bool {
        self.enabled
    }

    fn cache_key(&self, _session: &SessionState) -> Option<String> {
        self.cache_key.clone()
    }

    fn fetch_tables(&self, _session: &SessionState) -> Result<Vec<TableMeta>, MetadataError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }
        match &self.fail_with {
            Some(message) => Err(MetadataError::Fetch(message.clone())),
            None => Ok(self.tables.clone()),
        }
    }

    fn describe(&self, _session: &SessionState) -> String {
        format!("Reading metadata for catalog '{}'", self.alias)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Event bus that records everything published to it.
#[derive(Default)]
pub struct RecordingEventBus {
    events: Mutex<Vec<TaskEvent>>,
}

impl RecordingEventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventBus for RecordingEventBus {
    fn publish(&self, event: TaskEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Polls `condition` until it holds, panicking after ~1s.
pub async fn wait_for(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within timeout");
}
