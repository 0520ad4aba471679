use crate::storage::{FileBackend, MemoryBackend, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_DATABASE_NAME: &str = "memo";
pub const DEFAULT_STORE_NAME: &str = "memoes";
pub const SCHEMA_VERSION: u32 = 1;
/// Primary key field of stored memos
pub const KEY_PATH: &str = "id";
/// Local date-time in the `2024/1/5 9:04:03` style
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y/%-m/%-d %-H:%M:%S";

/// Memo store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database name
    pub database_name: String,

    /// Name of the object store holding the memos
    pub store_name: String,

    /// Schema version the database is opened at
    pub version: u32,

    /// Directory for file-backed databases; `None` keeps everything in memory
    pub data_dir: Option<PathBuf>,

    /// Maximum number of stored memos
    pub record_quota: Option<usize>,

    /// strftime-style pattern for memo timestamps
    pub timestamp_format: String,
}

impl StoreConfig {
    /// Create a new in-memory configuration with default names
    pub fn new() -> Self {
        Self {
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            store_name: DEFAULT_STORE_NAME.to_string(),
            version: SCHEMA_VERSION,
            data_dir: None,
            record_quota: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    /// Set the database name
    pub fn database(mut self, database: &str) -> Self {
        self.database_name = database.to_string();
        self
    }

    /// Set the object store name
    pub fn store(mut self, store: &str) -> Self {
        self.store_name = store.to_string();
        self
    }

    /// Set the schema version
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Persist databases under `dir`
    pub fn data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Keep databases in memory only
    pub fn in_memory(mut self) -> Self {
        self.data_dir = None;
        self
    }

    /// Limit the number of stored memos
    pub fn record_quota(mut self, limit: usize) -> Self {
        self.record_quota = Some(limit);
        self
    }

    /// Set the timestamp pattern
    pub fn timestamp_format(mut self, pattern: &str) -> Self {
        self.timestamp_format = pattern.to_string();
        self
    }

    /// Backend matching this configuration
    pub fn backend(&self) -> Arc<dyn StorageBackend> {
        match &self.data_dir {
            Some(dir) => Arc::new(FileBackend::new(dir)),
            None => Arc::new(MemoryBackend::new()),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
