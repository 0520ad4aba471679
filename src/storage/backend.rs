use super::error::{StoreError, StoreResult};
use super::object_store::ObjectStoreData;
use super::registry::LiveDatabases;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

/// Everything persisted for one database: its schema version and the
/// contents of each of its object stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseImage {
    pub name: String,
    pub version: u32,
    pub stores: BTreeMap<String, ObjectStoreData>,
}

impl DatabaseImage {
    /// An image for a database that has never been opened (version 0)
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: 0,
            stores: BTreeMap::new(),
        }
    }
}

/// Storage backend trait - where database images live between opens
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether the host allows local storage at all
    fn is_available(&self) -> bool {
        true
    }

    /// Load a database image, `None` if the database was never created
    async fn load(&self, name: &str) -> StoreResult<Option<DatabaseImage>>;

    /// Persist a full image (schema and all stores), used after upgrades
    async fn save_database(&self, image: &DatabaseImage) -> StoreResult<()>;

    /// Persist the contents of one object store after a committed write
    async fn save_store(&self, database: &str, store: &ObjectStoreData) -> StoreResult<()>;

    /// Databases currently open at this backend's location. Every handle to
    /// the same location must return the same registry.
    fn live_databases(&self) -> StoreResult<Arc<LiveDatabases>>;
}

/// Ephemeral backend. Clones share the same persisted images and the same
/// open databases, so gateways built on clones work on one set of stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    databases: Arc<Mutex<HashMap<String, DatabaseImage>>>,
    live: Arc<LiveDatabases>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database_names(&self) -> StoreResult<Vec<String>> {
        let databases = self.databases.lock()?;
        let mut names: Vec<String> = databases.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self, name: &str) -> StoreResult<Option<DatabaseImage>> {
        Ok(self.databases.lock()?.get(name).cloned())
    }

    async fn save_database(&self, image: &DatabaseImage) -> StoreResult<()> {
        self.databases
            .lock()?
            .insert(image.name.clone(), image.clone());
        Ok(())
    }

    async fn save_store(&self, database: &str, store: &ObjectStoreData) -> StoreResult<()> {
        let mut databases = self.databases.lock()?;
        let image = databases
            .get_mut(database)
            .ok_or_else(|| StoreError::Io(format!("database '{}' was never saved", database)))?;
        image.stores.insert(store.name().to_string(), store.clone());
        Ok(())
    }

    fn live_databases(&self) -> StoreResult<Arc<LiveDatabases>> {
        Ok(Arc::clone(&self.live))
    }
}

/// Backend for hosts where local storage is disabled, such as private or
/// restricted browsing contexts. Every operation fails.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend {
    reason: Option<String>,
}

impl UnavailableBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reason(reason: &str) -> Self {
        Self {
            reason: Some(reason.to_string()),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::StorageUnavailable(
            self.reason
                .clone()
                .unwrap_or_else(|| "local storage is not supported".to_string()),
        )
    }
}

#[async_trait]
impl StorageBackend for UnavailableBackend {
    fn is_available(&self) -> bool {
        false
    }

    async fn load(&self, _name: &str) -> StoreResult<Option<DatabaseImage>> {
        Err(self.error())
    }

    async fn save_database(&self, _image: &DatabaseImage) -> StoreResult<()> {
        Err(self.error())
    }

    async fn save_store(&self, _database: &str, _store: &ObjectStoreData) -> StoreResult<()> {
        Err(self.error())
    }

    fn live_databases(&self) -> StoreResult<Arc<LiveDatabases>> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::object_store::StoreOptions;

    #[tokio::test]
    async fn test_memory_backend_shared_between_clones() {
        let backend = MemoryBackend::new();
        let other = backend.clone();

        let mut image = DatabaseImage::empty("memo");
        image.version = 1;
        image.stores.insert(
            "memoes".to_string(),
            ObjectStoreData::new("memoes", StoreOptions::new()),
        );
        backend.save_database(&image).await.unwrap();

        let loaded = other.load("memo").await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert!(loaded.stores.contains_key("memoes"));
        assert_eq!(other.database_names().unwrap(), vec!["memo".to_string()]);
        assert!(Arc::ptr_eq(
            &backend.live_databases().unwrap(),
            &other.live_databases().unwrap()
        ));
    }

    #[test]
    fn test_separate_memory_backends_do_not_share() {
        let first = MemoryBackend::new();
        let second = MemoryBackend::new();
        assert!(!Arc::ptr_eq(
            &first.live_databases().unwrap(),
            &second.live_databases().unwrap()
        ));
    }

    #[tokio::test]
    async fn test_memory_backend_save_store_requires_database() {
        let backend = MemoryBackend::new();
        let store = ObjectStoreData::new("memoes", StoreOptions::new());
        assert!(backend.save_store("missing", &store).await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_everything() {
        let backend = UnavailableBackend::with_reason("private browsing");
        assert!(!backend.is_available());
        match backend.load("memo").await {
            Err(StoreError::StorageUnavailable(reason)) => assert_eq!(reason, "private browsing"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
