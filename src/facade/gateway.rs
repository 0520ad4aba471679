use crate::connection::{KEY_PATH, StoreConfig};
use crate::core::{MemoError, NewRecord, Record, RecordId, Result};
use crate::storage::{
    CursorDirection, Database, OpenRequest, StorageBackend, StoreError, StoreOptions,
};
use crate::transaction::{Cursor, TransactionMode};
use futures::Stream;
use log::info;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Outcome of a successful [`RecordStoreGateway::open`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready {
    pub database: String,
    pub version: u32,
    pub store: String,
}

/// Gateway to the memo object store.
///
/// Owns the one connection every operation reuses. The connection is opened
/// lazily by [`open`](Self::open); concurrent callers share a single open.
/// Each data operation runs in its own transaction.
///
/// # Examples
///
/// ```
/// use memocards::{NewRecord, RecordStoreGateway, StoreConfig};
///
/// # #[tokio::main]
/// # async fn main() -> memocards::Result<()> {
/// let gateway = RecordStoreGateway::new(StoreConfig::new());
/// gateway.open().await?;
///
/// let id = gateway.insert(&NewRecord::new("Groceries", "Milk, eggs", "2024/1/5 9:00:00")).await?;
/// let record = gateway.get_by_identity(id).await?.unwrap();
/// assert_eq!(record.title, "Groceries");
/// # Ok(())
/// # }
/// ```
pub struct RecordStoreGateway {
    config: StoreConfig,
    backend: Arc<dyn StorageBackend>,
    connection: OnceCell<Arc<Database>>,
}

impl RecordStoreGateway {
    /// Gateway over the backend described by `config`
    pub fn new(config: StoreConfig) -> Self {
        let backend = config.backend();
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: StoreConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            config,
            backend,
            connection: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.connection.initialized()
    }

    /// Open the database, creating the memo store on first use.
    ///
    /// Calling it again after success returns the same connection.
    pub async fn open(&self) -> Result<Ready> {
        let database = self
            .connection
            .get_or_try_init(|| self.connect())
            .await?;
        Ok(Ready {
            database: database.name().to_string(),
            version: database.version(),
            store: self.config.store_name.clone(),
        })
    }

    async fn connect(&self) -> Result<Arc<Database>> {
        let store_name = self.config.store_name.as_str();
        let database = OpenRequest::new(&self.config.database_name, self.config.version)
            .record_quota(self.config.record_quota)
            .open(Arc::clone(&self.backend), |upgrade| {
                if upgrade.object_store_names().iter().any(|name| name == store_name) {
                    return Ok(());
                }
                upgrade.create_object_store(
                    store_name,
                    StoreOptions::new().key_path(KEY_PATH).auto_increment(true),
                )
            })
            .await
            .map_err(|err| match err {
                StoreError::StorageUnavailable(reason) => MemoError::StorageUnavailable(reason),
                other => MemoError::Connection(other.to_string()),
            })?;

        if !database.object_store_names().iter().any(|name| name == store_name) {
            return Err(MemoError::Connection(format!(
                "object store '{}' does not exist in database '{}'",
                store_name,
                database.name()
            )));
        }

        info!(
            "connected to database '{}' (version {})",
            database.name(),
            database.version()
        );
        Ok(Arc::new(database))
    }

    fn database(&self) -> Result<&Arc<Database>> {
        self.connection
            .get()
            .ok_or_else(|| MemoError::Connection("database is not open".to_string()))
    }

    /// Store a new memo and return the identity the store assigned to it.
    pub async fn insert(&self, candidate: &NewRecord) -> Result<RecordId> {
        let database = self.database()?;
        let value = serde_json::to_value(candidate).map_err(MemoError::write)?;

        let mut transaction = database
            .transaction(&self.config.store_name, TransactionMode::ReadWrite)
            .await
            .map_err(MemoError::write)?;
        let key = transaction.add(value).map_err(MemoError::write)?;
        transaction.commit().await.map_err(MemoError::write)?;

        let id = RecordId(key);
        info!("save completed, ID: {}", id);
        Ok(id)
    }

    /// Delete a memo. Deleting an identity that is not stored succeeds.
    pub async fn delete_by_identity(&self, id: RecordId) -> Result<()> {
        let database = self.database()?;
        let mut transaction = database
            .transaction(&self.config.store_name, TransactionMode::ReadWrite)
            .await
            .map_err(MemoError::write)?;
        transaction.delete(id.as_u64()).map_err(MemoError::write)?;
        transaction.commit().await.map_err(MemoError::write)?;

        info!("delete completed, ID: {}", id);
        Ok(())
    }

    pub async fn get_by_identity(&self, id: RecordId) -> Result<Option<Record>> {
        let database = self.database()?;
        let transaction = database
            .transaction(&self.config.store_name, TransactionMode::ReadOnly)
            .await
            .map_err(MemoError::read)?;
        let value = transaction.get(id.as_u64()).map_err(MemoError::read)?;
        transaction.commit().await.map_err(MemoError::read)?;

        info!("fetch completed, ID: {}", id);
        value.map(decode_record).transpose()
    }

    /// Number of stored memos
    pub async fn count(&self) -> Result<usize> {
        let database = self.database()?;
        let transaction = database
            .transaction(&self.config.store_name, TransactionMode::ReadOnly)
            .await
            .map_err(MemoError::read)?;
        let count = transaction.count().map_err(MemoError::read)?;
        transaction.commit().await.map_err(MemoError::read)?;
        Ok(count)
    }

    /// Walk all memos in ascending identity order.
    ///
    /// The walk runs inside one read-only transaction that stays open until
    /// the cursor is exhausted or dropped; writers wait for it.
    pub async fn list_all_ascending(&self) -> Result<RecordCursor> {
        let database = self.database()?;
        let transaction = database
            .transaction(&self.config.store_name, TransactionMode::ReadOnly)
            .await
            .map_err(MemoError::read)?;
        let cursor = transaction
            .open_cursor(CursorDirection::Next)
            .map_err(MemoError::read)?;
        Ok(RecordCursor { inner: cursor })
    }
}

impl std::fmt::Debug for RecordStoreGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStoreGateway")
            .field("config", &self.config)
            .field("connection", &self.connection.get())
            .finish()
    }
}

/// Lazy, finite sequence of stored memos. Each [`next`](Self::next) call
/// fetches exactly one record.
#[derive(Debug)]
pub struct RecordCursor {
    inner: Cursor,
}

impl RecordCursor {
    pub async fn next(&mut self) -> Result<Option<Record>> {
        match self.inner.next().await.map_err(MemoError::read)? {
            Some((_, value)) => decode_record(value).map(Some),
            None => Ok(None),
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Record>> {
        futures::stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(Some(record)) => Some((Ok(record), Some(cursor))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

fn decode_record(value: Value) -> Result<Record> {
    serde_json::from_value(value).map_err(MemoError::read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBackend, UnavailableBackend};
    use futures::TryStreamExt;

    fn candidate(title: &str, body: &str) -> NewRecord {
        NewRecord::new(title, body, "2024/1/5 9:00:00")
    }

    async fn open_gateway() -> RecordStoreGateway {
        let gateway = RecordStoreGateway::new(StoreConfig::new());
        gateway.open().await.unwrap();
        gateway
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let gateway = RecordStoreGateway::new(StoreConfig::new());
        assert!(!gateway.is_open());
        let first = gateway.open().await.unwrap();
        let second = gateway.open().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.database, "memo");
        assert_eq!(first.version, 1);
        assert_eq!(first.store, "memoes");
        assert!(gateway.is_open());
    }

    #[tokio::test]
    async fn test_operations_before_open_fail() {
        let gateway = RecordStoreGateway::new(StoreConfig::new());
        let err = gateway.insert(&candidate("a", "b")).await.unwrap_err();
        assert!(matches!(err, MemoError::Connection(_)));
        assert!(gateway.list_all_ascending().await.is_err());
    }

    #[tokio::test]
    async fn test_unavailable_storage_is_fatal() {
        let gateway =
            RecordStoreGateway::with_backend(StoreConfig::new(), Arc::new(UnavailableBackend::new()));
        let err = gateway.open().await.unwrap_err();
        assert!(matches!(err, MemoError::StorageUnavailable(_)));
        assert!(err.is_fatal());
        assert!(!gateway.is_open());
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let gateway = open_gateway().await;
        let id = gateway.insert(&candidate("Groceries", "Milk, eggs")).await.unwrap();
        assert_eq!(id, RecordId(1));

        let record = gateway.get_by_identity(id).await.unwrap().unwrap();
        assert_eq!(record.title, "Groceries");
        assert_eq!(record.body, "Milk, eggs");
        assert_eq!(record.write_date, "2024/1/5 9:00:00");
    }

    #[tokio::test]
    async fn test_list_as_stream() {
        let gateway = open_gateway().await;
        for title in ["a", "b", "c"] {
            gateway.insert(&candidate(title, "x")).await.unwrap();
        }
        let records: Vec<Record> = gateway
            .list_all_ascending()
            .await
            .unwrap()
            .into_stream()
            .try_collect()
            .await
            .unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_quota_exceeded_is_write_error() {
        let gateway = RecordStoreGateway::new(StoreConfig::new().record_quota(1));
        gateway.open().await.unwrap();
        gateway.insert(&candidate("a", "b")).await.unwrap();

        let err = gateway.insert(&candidate("c", "d")).await.unwrap_err();
        assert!(matches!(err, MemoError::Write(_)));
        assert_eq!(gateway.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_existing_store_reused_on_reopen() {
        let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let first = RecordStoreGateway::with_backend(StoreConfig::new(), Arc::clone(&backend));
        first.open().await.unwrap();
        first.insert(&candidate("a", "b")).await.unwrap();

        let second = RecordStoreGateway::with_backend(StoreConfig::new(), backend);
        second.open().await.unwrap();
        assert_eq!(second.count().await.unwrap(), 1);
        assert_eq!(second.insert(&candidate("c", "d")).await.unwrap(), RecordId(2));
    }
}
