//! File-backed persistence for local databases.
//!
//! Layout, one directory per database under the backend root:
//!
//! ```text
//! <root>/<database>/manifest.mp     name, version, store names
//! <root>/<database>/<store>.store   key generator + records
//! ```
//!
//! Every file is MessagePack and replaced atomically (temp file + rename),
//! so a crash mid-commit leaves the previous contents readable. A temp file
//! is named after its full target (`manifest.mp.tmp`, `<store>.store.tmp`),
//! so no two targets share one.
//!
//! Backends pointing at the same root share one registry of open databases,
//! however many `FileBackend` values were built for it.

use super::backend::{DatabaseImage, StorageBackend};
use super::error::{StoreError, StoreResult};
use super::object_store::ObjectStoreData;
use super::registry::LiveDatabases;
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;

const MANIFEST_FILE: &str = "manifest.mp";
const STORE_EXTENSION: &str = "store";
const TEMP_SUFFIX: &str = ".tmp";

// Open databases per backend root
lazy_static! {
    static ref LIVE_ROOTS: Mutex<HashMap<PathBuf, Arc<LiveDatabases>>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseManifest {
    name: String,
    version: u32,
    stores: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root as a registry key: canonical when the directory exists
    fn location(&self) -> PathBuf {
        std::fs::canonicalize(&self.root)
            .or_else(|_| std::path::absolute(&self.root))
            .unwrap_or_else(|_| self.root.clone())
    }

    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn store_path(&self, database: &str, store: &str) -> PathBuf {
        self.database_dir(database)
            .join(format!("{}.{}", store, STORE_EXTENSION))
    }

    async fn write_store(&self, database: &str, store: &ObjectStoreData) -> StoreResult<()> {
        let bytes = rmp_serde::to_vec(store).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize object store '{}': {}", store.name(), e))
        })?;
        atomic_write(&self.store_path(database, store.name()), &bytes).await
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn load(&self, name: &str) -> StoreResult<Option<DatabaseImage>> {
        let manifest_path = self.database_dir(name).join(MANIFEST_FILE);
        let Some(bytes) = read_optional(&manifest_path).await? else {
            return Ok(None);
        };
        let manifest: DatabaseManifest = rmp_serde::from_slice(&bytes).map_err(|e| {
            StoreError::Serialization(format!("Failed to deserialize manifest '{}': {}", manifest_path.display(), e))
        })?;

        let mut stores = BTreeMap::new();
        for store_name in manifest.stores {
            let path = self.store_path(name, &store_name);
            let bytes = read_optional(&path).await?.ok_or_else(|| {
                StoreError::Io(format!("Object store file '{}' is missing", path.display()))
            })?;
            let store: ObjectStoreData = rmp_serde::from_slice(&bytes).map_err(|e| {
                StoreError::Serialization(format!("Failed to deserialize object store '{}': {}", path.display(), e))
            })?;
            stores.insert(store_name, store);
        }

        Ok(Some(DatabaseImage {
            name: manifest.name,
            version: manifest.version,
            stores,
        }))
    }

    async fn save_database(&self, image: &DatabaseImage) -> StoreResult<()> {
        for store in image.stores.values() {
            self.write_store(&image.name, store).await?;
        }

        // Manifest goes last: until it lands, the previous schema stays authoritative.
        let manifest = DatabaseManifest {
            name: image.name.clone(),
            version: image.version,
            stores: image.stores.keys().cloned().collect(),
        };
        let bytes = rmp_serde::to_vec(&manifest).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize manifest: {}", e))
        })?;
        atomic_write(&self.database_dir(&image.name).join(MANIFEST_FILE), &bytes).await
    }

    async fn save_store(&self, database: &str, store: &ObjectStoreData) -> StoreResult<()> {
        self.write_store(database, store).await
    }

    fn live_databases(&self) -> StoreResult<Arc<LiveDatabases>> {
        let mut roots = LIVE_ROOTS.lock()?;
        Ok(Arc::clone(roots.entry(self.location()).or_default()))
    }
}

async fn read_optional(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(StoreError::Io(format!(
            "Failed to read '{}': {}",
            path.display(),
            err
        ))),
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|err| {
            StoreError::Io(format!(
                "Failed to create parent directory '{}': {}",
                parent.display(),
                err
            ))
        })?;
    }

    let mut tmp_name = path
        .file_name()
        .ok_or_else(|| StoreError::Io(format!("'{}' has no file name", path.display())))?
        .to_os_string();
    tmp_name.push(TEMP_SUFFIX);
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, bytes).await.map_err(|err| {
        StoreError::Io(format!(
            "Failed to write temp file '{}': {}",
            tmp.display(),
            err
        ))
    })?;

    fs::rename(&tmp, path).await.map_err(|err| {
        StoreError::Io(format!(
            "Failed to rename temp file '{}' -> '{}': {}",
            tmp.display(),
            path.display(),
            err
        ))
    })?;
    Ok(())
}
