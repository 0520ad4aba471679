// ============================================================================
// Transaction State Management
// ============================================================================
//
// A transaction is scoped to one object store and moves through
// Active -> Committed/Aborted.
//
// - Read-only transactions hold a shared lock on the store and read the
//   committed contents directly, so they see one consistent snapshot.
// - Read-write transactions hold the store exclusively and write to a
//   private copy (Copy-on-Write). Commit persists the copy and swaps it in;
//   abort or drop throws it away.
//
// ============================================================================

use super::cursor::Cursor;
use crate::storage::backend::StorageBackend;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::object_store::{CursorDirection, ObjectStoreData};
use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard};

/// Global transaction ID counter
static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Generate a new unique transaction ID
    pub fn new() -> Self {
        TransactionId(NEXT_TXN_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

impl std::fmt::Display for TransactionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionMode::ReadOnly => write!(f, "readonly"),
            TransactionMode::ReadWrite => write!(f, "readwrite"),
        }
    }
}

/// Transaction state following the State Pattern
///
/// State transitions:
/// ```text
/// Active ──commit──> Committed
///   │
///   └──abort / failed request / drop──> Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can execute requests
    Active,

    /// Transaction has been successfully committed
    Committed,

    /// Transaction has been aborted
    Aborted,
}

impl TransactionState {
    /// Check if transaction can execute requests
    pub fn is_active(&self) -> bool {
        matches!(self, TransactionState::Active)
    }

    /// Check if transaction is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionState::Committed | TransactionState::Aborted
        )
    }
}

impl std::fmt::Display for TransactionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::Aborted => write!(f, "ABORTED"),
        }
    }
}

enum Scope {
    Read(OwnedRwLockReadGuard<ObjectStoreData>),
    Write {
        guard: OwnedRwLockWriteGuard<ObjectStoreData>,
        /// Private copy, created on the first write
        staged: Option<ObjectStoreData>,
        database: String,
        backend: Arc<dyn StorageBackend>,
        record_quota: Option<usize>,
    },
}

/// A transaction over a single object store.
///
/// Requests (`get`, `add`, `delete`, ...) run immediately against the
/// transaction's view of the store. A failed write request aborts the whole
/// transaction, matching the all-or-nothing contract: nothing staged before
/// the failure becomes visible.
pub struct Transaction {
    id: TransactionId,
    state: TransactionState,
    scope: Scope,
}

impl Transaction {
    pub(crate) fn read_only(guard: OwnedRwLockReadGuard<ObjectStoreData>) -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Active,
            scope: Scope::Read(guard),
        }
    }

    pub(crate) fn read_write(
        guard: OwnedRwLockWriteGuard<ObjectStoreData>,
        database: String,
        backend: Arc<dyn StorageBackend>,
        record_quota: Option<usize>,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            state: TransactionState::Active,
            scope: Scope::Write {
                guard,
                staged: None,
                database,
                backend,
                record_quota,
            },
        }
    }

    /// Get the transaction ID
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Get the current state
    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn mode(&self) -> TransactionMode {
        match self.scope {
            Scope::Read(_) => TransactionMode::ReadOnly,
            Scope::Write { .. } => TransactionMode::ReadWrite,
        }
    }

    pub fn store_name(&self) -> &str {
        self.view().name()
    }

    pub(crate) fn ensure_active(&self) -> StoreResult<()> {
        if !self.state.is_active() {
            return Err(StoreError::TransactionInactive(self.id));
        }
        Ok(())
    }

    /// The store as this transaction sees it: staged writes included.
    pub(crate) fn view(&self) -> &ObjectStoreData {
        match &self.scope {
            Scope::Read(guard) => &**guard,
            Scope::Write { guard, staged, .. } => staged.as_ref().unwrap_or(&**guard),
        }
    }

    fn staged_mut(&mut self) -> StoreResult<(&mut ObjectStoreData, Option<usize>)> {
        self.ensure_active()?;
        match &mut self.scope {
            Scope::Read(_) => Err(StoreError::ReadOnly(self.id)),
            Scope::Write {
                guard,
                staged,
                record_quota,
                ..
            } => {
                let data = staged.get_or_insert_with(|| (**guard).clone());
                Ok((data, *record_quota))
            }
        }
    }

    fn fail<T>(&mut self, err: StoreError) -> StoreResult<T> {
        warn!("{} aborted: {}", self.id, err);
        self.discard();
        Err(err)
    }

    fn discard(&mut self) {
        self.state = TransactionState::Aborted;
        if let Scope::Write { staged, .. } = &mut self.scope {
            *staged = None;
        }
    }

    pub fn get(&self, key: u64) -> StoreResult<Option<Value>> {
        self.ensure_active()?;
        Ok(self.view().get(key).cloned())
    }

    pub fn count(&self) -> StoreResult<usize> {
        self.ensure_active()?;
        Ok(self.view().len())
    }

    /// Add a value, returning its key. Fails if the key is already taken.
    pub fn add(&mut self, value: Value) -> StoreResult<u64> {
        let (data, quota) = self.staged_mut()?;
        match data.add(value, quota) {
            Ok(key) => Ok(key),
            Err(err) => self.fail(err),
        }
    }

    /// Add or replace a value, returning its key
    pub fn put(&mut self, value: Value) -> StoreResult<u64> {
        let (data, quota) = self.staged_mut()?;
        match data.put(value, quota) {
            Ok(key) => Ok(key),
            Err(err) => self.fail(err),
        }
    }

    /// Delete by key. A missing key is not an error; the return value tells
    /// whether something was removed.
    pub fn delete(&mut self, key: u64) -> StoreResult<bool> {
        let (data, _) = self.staged_mut()?;
        Ok(data.delete(key))
    }

    pub fn clear(&mut self) -> StoreResult<()> {
        let (data, _) = self.staged_mut()?;
        data.clear();
        Ok(())
    }

    /// Turn this transaction into a cursor over its store.
    pub fn open_cursor(self, direction: CursorDirection) -> StoreResult<Cursor> {
        self.ensure_active()?;
        Ok(Cursor::new(self, direction))
    }

    /// Finish the transaction.
    ///
    /// For read-write transactions the staged store is persisted through the
    /// backend and only then published. If persisting fails the transaction
    /// is aborted and the store keeps its previous contents.
    pub async fn commit(mut self) -> StoreResult<()> {
        self.ensure_active()?;

        if let Scope::Write {
            guard,
            staged,
            database,
            backend,
            ..
        } = &mut self.scope
        {
            if let Some(data) = staged.take() {
                if let Err(err) = backend.save_store(database, &data).await {
                    warn!("{} aborted while persisting: {}", self.id, err);
                    self.state = TransactionState::Aborted;
                    return Err(err);
                }
                **guard = data;
            }
        }

        self.state = TransactionState::Committed;
        debug!("{} committed", self.id);
        Ok(())
    }

    /// Abort explicitly, discarding staged writes
    pub fn abort(mut self) {
        self.discard();
        debug!("{} aborted", self.id);
    }

    pub(crate) fn complete(&mut self) {
        if self.state.is_active() {
            self.state = TransactionState::Committed;
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Scope::Write { staged: Some(_), .. } = &self.scope {
            if self.state.is_active() {
                debug!("{} dropped without commit, discarding changes", self.id);
            }
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("mode", &self.mode())
            .field("state", &self.state)
            .field("store", &self.store_name())
            .finish()
    }
}
