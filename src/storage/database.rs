use super::backend::{DatabaseImage, StorageBackend};
use super::error::{StoreError, StoreResult};
use super::object_store::{ObjectStoreData, StoreOptions};
use super::registry::{LiveDatabase, SharedStore};
use crate::transaction::{Transaction, TransactionMode};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Request to open a named database at a given schema version.
///
/// ```no_run
/// # use memocards::storage::{MemoryBackend, OpenRequest, StoreOptions};
/// # use std::sync::Arc;
/// # async fn demo() -> memocards::storage::StoreResult<()> {
/// let db = OpenRequest::new("memo", 1)
///     .open(Arc::new(MemoryBackend::new()), |upgrade| {
///         upgrade.create_object_store("memoes", StoreOptions::new().key_path("id").auto_increment(true))
///     })
///     .await?;
/// assert_eq!(db.version(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenRequest {
    name: String,
    version: u32,
    record_quota: Option<usize>,
}

impl OpenRequest {
    pub fn new(name: &str, version: u32) -> Self {
        Self {
            name: name.to_string(),
            version,
            record_quota: None,
        }
    }

    /// Limit every object store of the opened database to `limit` records
    pub fn record_quota(mut self, limit: Option<usize>) -> Self {
        self.record_quota = limit;
        self
    }

    /// Open the database, running `upgrade` first when the persisted
    /// version is below the requested one (or nothing is persisted yet).
    ///
    /// The upgrade runs against a copy of the schema; it only becomes
    /// visible once the upgraded image has been persisted. A database that
    /// is already open at this backend's location is joined rather than
    /// reloaded, so every connection shares the same stores and key
    /// generators.
    pub async fn open<F>(self, backend: Arc<dyn StorageBackend>, upgrade: F) -> StoreResult<Database>
    where
        F: FnOnce(&mut UpgradeContext<'_>) -> StoreResult<()>,
    {
        if self.version == 0 {
            return Err(StoreError::InvalidVersion(self.version));
        }
        validate_name(&self.name, "database")?;
        if !backend.is_available() {
            return Err(StoreError::StorageUnavailable(
                "local storage is not supported".to_string(),
            ));
        }

        let registry = backend.live_databases()?;
        let _opening = registry.lock_opening().await;
        let live = registry.get(&self.name)?;

        // Pinned stores take no commits between the snapshot and the upgraded image.
        let mut pinned = Vec::new();
        let mut image = match &live {
            Some(live) if live.version == self.version => {
                debug!("joined open database '{}' (version {})", self.name, live.version);
                return Ok(Database::from_live(&self.name, live, backend, self.record_quota));
            }
            Some(live) => {
                let mut image = DatabaseImage::empty(&self.name);
                image.version = live.version;
                for (name, store) in &live.stores {
                    let guard = Arc::clone(store).read_owned().await;
                    image.stores.insert(name.clone(), (*guard).clone());
                    pinned.push(guard);
                }
                image
            }
            None => backend
                .load(&self.name)
                .await?
                .unwrap_or_else(|| DatabaseImage::empty(&self.name)),
        };

        if image.version > self.version {
            return Err(StoreError::VersionError {
                name: self.name,
                current: image.version,
                requested: self.version,
            });
        }

        if image.version < self.version {
            let old_version = image.version;
            let mut upgraded = image.clone();
            upgraded.version = self.version;
            {
                let mut ctx = UpgradeContext {
                    image: &mut upgraded,
                    old_version,
                };
                upgrade(&mut ctx)?;
            }
            backend.save_database(&upgraded).await?;
            info!(
                "database '{}' upgraded from version {} to {}",
                self.name, old_version, self.version
            );
            image = upgraded;
        }

        // Stores that survive an upgrade keep the handles open connections hold.
        let stores = image
            .stores
            .into_iter()
            .map(|(name, data)| {
                let shared = live
                    .as_ref()
                    .and_then(|live| live.stores.get(&name).cloned())
                    .unwrap_or_else(|| Arc::new(RwLock::new(data)));
                (name, shared)
            })
            .collect();
        drop(pinned);

        let live = Arc::new(LiveDatabase {
            version: image.version,
            stores,
        });
        registry.insert(&self.name, Arc::clone(&live))?;
        Ok(Database::from_live(&self.name, &live, backend, self.record_quota))
    }
}

/// Schema access handed to the upgrade callback of [`OpenRequest::open`].
pub struct UpgradeContext<'a> {
    image: &'a mut DatabaseImage,
    old_version: u32,
}

impl UpgradeContext<'_> {
    /// Version persisted before this upgrade, 0 for a fresh database
    pub fn old_version(&self) -> u32 {
        self.old_version
    }

    pub fn new_version(&self) -> u32 {
        self.image.version
    }

    pub fn object_store_names(&self) -> Vec<String> {
        self.image.stores.keys().cloned().collect()
    }

    pub fn create_object_store(&mut self, name: &str, options: StoreOptions) -> StoreResult<()> {
        validate_name(name, "object store")?;
        if self.image.stores.contains_key(name) {
            return Err(StoreError::StoreExists(name.to_string()));
        }
        self.image
            .stores
            .insert(name.to_string(), ObjectStoreData::new(name, options));
        debug!("object store '{}' created in '{}'", name, self.image.name);
        Ok(())
    }

    pub fn delete_object_store(&mut self, name: &str) -> StoreResult<()> {
        self.image
            .stores
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::StoreNotFound(name.to_string()))
    }
}

/// An open database connection.
///
/// Each object store sits behind its own lock, shared by every connection
/// to the database: read-only transactions share it, read-write
/// transactions hold it exclusively until they finish.
pub struct Database {
    name: String,
    version: u32,
    stores: HashMap<String, SharedStore>,
    backend: Arc<dyn StorageBackend>,
    record_quota: Option<usize>,
}

impl Database {
    /// Shorthand for [`OpenRequest::new`] + [`OpenRequest::open`]
    pub async fn open<F>(
        name: &str,
        version: u32,
        backend: Arc<dyn StorageBackend>,
        upgrade: F,
    ) -> StoreResult<Database>
    where
        F: FnOnce(&mut UpgradeContext<'_>) -> StoreResult<()>,
    {
        OpenRequest::new(name, version).open(backend, upgrade).await
    }

    fn from_live(
        name: &str,
        live: &LiveDatabase,
        backend: Arc<dyn StorageBackend>,
        record_quota: Option<usize>,
    ) -> Self {
        Self {
            name: name.to_string(),
            version: live.version,
            stores: live.stores.clone(),
            backend,
            record_quota,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn record_quota(&self) -> Option<usize> {
        self.record_quota
    }

    pub fn object_store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.keys().cloned().collect();
        names.sort();
        names
    }

    /// Start a transaction over one object store.
    ///
    /// Waits until the store's lock can be taken in the requested mode.
    pub async fn transaction(&self, store: &str, mode: TransactionMode) -> StoreResult<Transaction> {
        let handle = self
            .stores
            .get(store)
            .cloned()
            .ok_or_else(|| StoreError::StoreNotFound(store.to_string()))?;

        let transaction = match mode {
            TransactionMode::ReadOnly => Transaction::read_only(handle.read_owned().await),
            TransactionMode::ReadWrite => Transaction::read_write(
                handle.write_owned().await,
                self.name.clone(),
                Arc::clone(&self.backend),
                self.record_quota,
            ),
        };
        debug!(
            "{} started on '{}' ({})",
            transaction.id(),
            store,
            transaction.mode()
        );
        Ok(transaction)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("stores", &self.object_store_names())
            .field("record_quota", &self.record_quota)
            .finish()
    }
}

fn validate_name(name: &str, kind: &str) -> StoreResult<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(StoreError::DataError(format!(
            "invalid {} name '{}'",
            kind, name
        )));
    }
    Ok(())
}
