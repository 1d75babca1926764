/// Identifier Cache - identifier -> numeric ID mapping with a JSON snapshot on disk
use crate::{
    error::CheckResult,
    identity::{CacheStats, STATS_SAMPLE_SIZE},
    metrics,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const CACHE_TYPE: &str = "rid_cache";

/// In-memory table; `order` tracks insertion order for stats and snapshots
#[derive(Debug, Default)]
struct CacheTable {
    entries: HashMap<String, String>,
    order: Vec<String>,
    /// Bumped on every persisted mutation
    generation: u64,
}

impl CacheTable {
    fn from_entries(loaded: Vec<(String, String)>) -> Self {
        let mut table = Self::default();
        for (identifier, rid) in loaded {
            table.insert(identifier, rid);
        }
        table
    }

    /// Overwriting keeps the key's original position
    fn insert(&mut self, identifier: String, rid: String) {
        if self.entries.insert(identifier.clone(), rid).is_none() {
            self.order.push(identifier);
        }
    }

    fn remove(&mut self, identifier: &str) -> Option<String> {
        let removed = self.entries.remove(identifier)?;
        self.order.retain(|key| key != identifier);
        Some(removed)
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|rid| (key, rid)))
    }

    fn to_json(&self) -> CheckResult<String> {
        let map: Map<String, Value> = self
            .iter()
            .map(|(key, rid)| (key.clone(), Value::String(rid.clone())))
            .collect();
        Ok(serde_json::to_string_pretty(&map)?)
    }
}

/// Serializes snapshot writes and remembers the newest generation on disk
#[derive(Debug)]
struct SnapshotFile {
    path: PathBuf,
    last_written: Mutex<u64>,
}

/// Identifier cache manager
///
/// Entries never expire. All access goes through one lock; the snapshot is
/// rewritten in full after every `put` and `clear`, outside that lock.
#[derive(Clone, Debug)]
pub struct IdCache {
    table: Arc<Mutex<CacheTable>>,
    snapshot: Option<Arc<SnapshotFile>>,
}

impl IdCache {
    /// Create a cache with no snapshot file
    pub fn in_memory() -> Self {
        Self {
            table: Arc::new(Mutex::new(CacheTable::default())),
            snapshot: None,
        }
    }

    /// Open a cache backed by the snapshot at `path`
    ///
    /// Loading happens once, before the cache is handed out. A missing,
    /// unreadable or malformed snapshot yields an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = load_snapshot(&path);
        info!("Loaded {} cached identifiers from {}", loaded.len(), path.display());

        let table = CacheTable::from_entries(loaded);
        metrics::set_cache_size(table.entries.len());

        Self {
            table: Arc::new(Mutex::new(table)),
            snapshot: Some(Arc::new(SnapshotFile {
                path,
                last_written: Mutex::new(0),
            })),
        }
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref().map(|s| s.path.as_path())
    }

    /// Get cached numeric ID text for an identifier
    pub async fn get(&self, identifier: &str) -> Option<String> {
        let cached = self.table.lock().await.entries.get(identifier).cloned();
        metrics::record_cache_access(CACHE_TYPE, cached.is_some());
        cached
    }

    /// Insert or overwrite a mapping, then persist the snapshot
    pub async fn put(&self, identifier: &str, rid: impl Into<String>) {
        let rid = rid.into();
        let pending = {
            let mut table = self.table.lock().await;
            table.insert(identifier.to_string(), rid);
            self.prepare_snapshot(&mut table)
        };

        self.persist(pending).await;
    }

    /// Remove a mapping without persisting
    ///
    /// Used when evicting a corrupt entry right before a fresh `put`.
    pub async fn remove(&self, identifier: &str) -> Option<String> {
        let mut table = self.table.lock().await;
        let removed = table.remove(identifier);
        metrics::set_cache_size(table.entries.len());
        removed
    }

    /// Empty the cache, persist, and return how many entries were dropped
    pub async fn clear(&self) -> usize {
        let (removed, pending) = {
            let mut table = self.table.lock().await;
            let removed = table.entries.len();
            table.entries.clear();
            table.order.clear();
            (removed, self.prepare_snapshot(&mut table))
        };

        self.persist(pending).await;
        info!("Cleared {} cached identifiers", removed);
        removed
    }

    /// Size and up to `STATS_SAMPLE_SIZE` entries in insertion order
    pub async fn stats(&self) -> CacheStats {
        let table = self.table.lock().await;
        CacheStats {
            size: table.entries.len(),
            sample: table
                .iter()
                .take(STATS_SAMPLE_SIZE)
                .map(|(key, rid)| (key.clone(), rid.clone()))
                .collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Must be called with the table lock held
    fn prepare_snapshot(&self, table: &mut CacheTable) -> Option<(u64, String)> {
        metrics::set_cache_size(table.entries.len());
        self.snapshot.as_ref()?;

        table.generation += 1;
        match table.to_json() {
            Ok(json) => Some((table.generation, json)),
            Err(e) => {
                warn!("Failed to serialize cache snapshot: {}", e);
                metrics::record_snapshot_failure();
                None
            }
        }
    }

    /// Best-effort write; failures are logged and never surface to callers
    async fn persist(&self, pending: Option<(u64, String)>) {
        let (Some(snapshot), Some((generation, json))) = (self.snapshot.as_ref(), pending) else {
            return;
        };

        let mut last_written = snapshot.last_written.lock().await;
        if *last_written >= generation {
            // A newer snapshot already landed
            return;
        }

        match write_atomic(&snapshot.path, json.as_bytes()).await {
            Ok(()) => {
                *last_written = generation;
                debug!("Wrote cache snapshot generation {} to {}", generation, snapshot.path.display());
            }
            Err(e) => {
                metrics::record_snapshot_failure();
                warn!("Failed to write cache snapshot {}: {}", snapshot.path.display(), e);
            }
        }
    }
}

/// Read a snapshot file into ordered entries
fn load_snapshot(path: &Path) -> Vec<(String, String)> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No cache snapshot at {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read cache snapshot {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let map: Map<String, Value> = match serde_json::from_str(&data) {
        Ok(map) => map,
        Err(e) => {
            warn!("Ignoring malformed cache snapshot {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    map.into_iter()
        .filter_map(|(identifier, value)| match value {
            Value::String(rid) => Some((identifier, rid)),
            Value::Number(rid) => Some((identifier, rid.to_string())),
            other => {
                warn!("Skipping cache entry {} with value {}", identifier, other);
                None
            }
        })
        .collect()
}

/// Write to `<path>.tmp`, sync, then rename over `path`
async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp_path, path).await
}
