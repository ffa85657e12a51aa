use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::runtime::Handle;

use crate::MetadataError;
use crate::events::{EventBus, TaskEvent};
use crate::meta::TableMeta;

pub const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    catalog: String,
    key: String,
}

enum EntryState {
    /// A background load is populating this entry.
    Loading,
    Loaded {
        value: Arc<Vec<TableMeta>>,
        at: Instant,
    },
}

struct CacheEntry {
    state: EntryState,
    ttl: Duration,
}

/// TTL-keyed cache of expensive schema lookups, keyed by (catalog alias,
/// provider cache key).
///
/// Lookups never block: a miss schedules an asynchronous load on the
/// runtime's blocking pool and returns `None` immediately. Once populated,
/// an entry is immutable until its TTL elapses or it is invalidated; an
/// expired entry is treated as absent and reloaded on the next access. The
/// lock is scoped to the map's shards, so unrelated catalogs never block
/// each other.
pub struct MetadataCache {
    entries: Arc<DashMap<CacheKey, CacheEntry>>,
    runtime: Handle,
    events: Arc<dyn EventBus>,
}

impl MetadataCache {
    pub fn new(runtime: Handle, events: Arc<dyn EventBus>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            runtime,
            events,
        }
    }

    /// Returns the cached metadata for (`catalog`, `key`), or `None` while a
    /// load is absent/in flight. `label` names the load in progress events.
    #[tracing::instrument(level = "debug", skip_all, fields(catalog = catalog, key = key))]
    pub fn compute_if_absent<L>(
        &self,
        catalog: &str,
        key: &str,
        ttl: Duration,
        label: &str,
        loader: L,
    ) -> Option<Arc<Vec<TableMeta>>>
    where
        L: FnOnce() -> Result<Vec<TableMeta>, MetadataError> + Send + 'static,
    {
        let cache_key = CacheKey {
            catalog: catalog.to_string(),
            key: key.to_string(),
        };

        let mut schedule = false;
        {
            let mut entry = self.entries.entry(cache_key.clone()).or_insert_with(|| {
                schedule = true;
                CacheEntry {
                    state: EntryState::Loading,
                    ttl,
                }
            });
            let cached = match &entry.state {
                EntryState::Loading => None,
                EntryState::Loaded { value, at } if at.elapsed() < entry.ttl => {
                    Some(Arc::clone(value))
                }
                EntryState::Loaded { .. } => None,
            };
            if let Some(value) = cached {
                return Some(value);
            }
            if matches!(entry.state, EntryState::Loaded { .. }) {
                // expired: treat as absent and reload
                entry.state = EntryState::Loading;
                entry.ttl = ttl;
                schedule = true;
            }
        }

        if schedule {
            self.spawn_load(cache_key, label, loader);
        }
        None
    }

    /// Drops one entry so the next access reloads it.
    pub fn invalidate(&self, catalog: &str, key: &str) {
        self.entries.remove(&CacheKey {
            catalog: catalog.to_string(),
            key: key.to_string(),
        });
    }

    fn spawn_load<L>(&self, key: CacheKey, label: &str, loader: L)
    where
        L: FnOnce() -> Result<Vec<TableMeta>, MetadataError> + Send + 'static,
    {
        self.events.publish(TaskEvent::Started {
            catalog: key.catalog.clone(),
            key: key.key.clone(),
            label: label.to_string(),
        });

        let entries = Arc::clone(&self.entries);
        let events = Arc::clone(&self.events);
        self.runtime.spawn_blocking(move || {
            let (tables, error) = match loader() {
                Ok(tables) => (tables, None),
                Err(err) => {
                    tracing::warn!(
                        catalog = key.catalog.as_str(),
                        "metadata load failed: {err}"
                    );
                    (Vec::new(), Some(err.to_string()))
                }
            };
            // the entry is gone if the user invalidated it mid-load; the
            // result is simply dropped then
            if let Some(mut entry) = entries.get_mut(&key) {
                entry.state = EntryState::Loaded {
                    value: Arc::new(tables),
                    at: Instant::now(),
                };
            }
            events.publish(TaskEvent::Completed {
                catalog: key.catalog,
                key: key.key,
                error,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::events::NoopEventBus;

    struct RecordingBus {
        events: Mutex<Vec<TaskEvent>>,
    }

    impl RecordingBus {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<TaskEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventBus for RecordingBus {
        fn publish(&self, event: TaskEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn table(catalog: &str, name: &str) -> TableMeta {
        TableMeta {
            catalog: catalog.into(),
            name_parts: vec![name.into()],
            description: None,
            columns: Vec::new(),
        }
    }

    async fn wait_until(cache: &MetadataCache, catalog: &str, key: &str) -> Arc<Vec<TableMeta>> {
        for _ in 0..200 {
            if let Some(v) =
                cache.compute_if_absent(catalog, key, Duration::from_secs(60), "test", || {
                    panic!("loader must not run while another load is pending")
                })
            {
                return v;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("cache entry was never populated");
    }

    #[tokio::test]
    async fn first_access_schedules_and_returns_none() {
        let cache = MetadataCache::new(Handle::current(), Arc::new(NoopEventBus));
        let result = cache.compute_if_absent("hive", "v1", Duration::from_secs(60), "test", || {
            Ok(vec![table("hive", "orders")])
        });
        assert!(result.is_none());

        let tables = wait_until(&cache, "hive", "v1").await;
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name_parts, vec!["orders".to_string()]);
    }

    #[tokio::test]
    async fn expired_entries_invoke_the_loader_again() {
        let cache = MetadataCache::new(Handle::current(), Arc::new(NoopEventBus));
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        cache.compute_if_absent("hive", "v1", Duration::from_millis(1), "test", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(vec![table("hive", "orders")])
        });
        // let the load land, then outlive the 1ms ttl
        tokio::time::sleep(Duration::from_millis(10)).await;

        let c = Arc::clone(&count);
        let second =
            cache.compute_if_absent("hive", "v1", Duration::from_millis(1), "test", move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(vec![table("hive", "orders")])
            });
        assert!(second.is_none(), "expired entries are treated as absent");

        for _ in 0..200 {
            if count.load(Ordering::SeqCst) == 2 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("both calls should have invoked the loader");
    }

    #[tokio::test]
    async fn concurrent_misses_schedule_a_single_load() {
        let cache = MetadataCache::new(Handle::current(), Arc::new(NoopEventBus));
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let c = Arc::clone(&count);
            let result =
                cache.compute_if_absent("hive", "v1", Duration::from_secs(60), "test", move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(Duration::from_millis(20));
                    Ok(Vec::new())
                });
            assert!(result.is_none());
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_loads_populate_empty_and_carry_the_cause() {
        let bus = RecordingBus::new();
        let cache = MetadataCache::new(Handle::current(), bus.clone() as Arc<dyn EventBus>);

        cache.compute_if_absent("hive", "v1", Duration::from_secs(60), "Reading hive", || {
            Err(MetadataError::Fetch("connection refused".into()))
        });

        let tables = wait_until(&cache, "hive", "v1").await;
        assert!(tables.is_empty());

        let events = bus.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            TaskEvent::Started { catalog, label, .. }
                if catalog == "hive" && label == "Reading hive"
        ));
        assert!(matches!(
            &events[1],
            TaskEvent::Completed { error: Some(cause), .. }
                if cause.contains("connection refused")
        ));
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let cache = MetadataCache::new(Handle::current(), Arc::new(NoopEventBus));
        let count = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&count);
        cache.compute_if_absent("hive", "v1", Duration::from_secs(60), "test", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });
        wait_until(&cache, "hive", "v1").await;

        cache.invalidate("hive", "v1");

        let c = Arc::clone(&count);
        let result = cache.compute_if_absent("hive", "v1", Duration::from_secs(60), "test", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        });
        assert!(result.is_none());
        wait_until(&cache, "hive", "v1").await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn catalogs_do_not_interfere() {
        let cache = MetadataCache::new(Handle::current(), Arc::new(NoopEventBus));
        cache.compute_if_absent("a", "v1", Duration::from_secs(60), "test", || {
            Ok(vec![table("a", "left")])
        });
        cache.compute_if_absent("b", "v1", Duration::from_secs(60), "test", || {
            Ok(vec![table("b", "right")])
        });

        let a = wait_until(&cache, "a", "v1").await;
        let b = wait_until(&cache, "b", "v1").await;
        assert_eq!(a[0].catalog, "a");
        assert_eq!(b[0].catalog, "b");
    }
}
