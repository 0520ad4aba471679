use super::state::{Transaction, TransactionMode};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::object_store::CursorDirection;
use futures::Stream;
use serde_json::Value;

/// Forward-only walk over one object store.
///
/// Every step is an explicit request for exactly one entry: the cursor keeps
/// only the key it last returned and looks up the following one on demand,
/// so memory use does not grow with the size of the store. Once exhausted it
/// stays exhausted; a new walk needs a new transaction.
///
/// A cursor owns its transaction. Exhausting a read-only cursor completes
/// the transaction and releases the store.
#[derive(Debug)]
pub struct Cursor {
    transaction: Option<Transaction>,
    direction: CursorDirection,
    position: Option<u64>,
}

impl Cursor {
    pub(crate) fn new(transaction: Transaction, direction: CursorDirection) -> Self {
        Self {
            transaction: Some(transaction),
            direction,
            position: None,
        }
    }

    pub fn direction(&self) -> CursorDirection {
        self.direction
    }

    /// Key of the entry returned by the last step
    pub fn key(&self) -> Option<u64> {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.transaction.is_none()
    }

    /// Request the next entry. Yields to the scheduler before each step.
    pub async fn next(&mut self) -> StoreResult<Option<(u64, Value)>> {
        tokio::task::yield_now().await;
        self.step()
    }

    /// Move `count` entries ahead and return the entry landed on.
    /// `advance(1)` is the same as [`Cursor::next`].
    pub async fn advance(&mut self, count: u32) -> StoreResult<Option<(u64, Value)>> {
        if count == 0 {
            return Err(StoreError::DataError(
                "cursor advance count must be greater than zero".to_string(),
            ));
        }
        tokio::task::yield_now().await;
        let mut entry = None;
        for _ in 0..count {
            entry = self.step()?;
            if entry.is_none() {
                break;
            }
        }
        Ok(entry)
    }

    /// Hand the transaction back, e.g. to commit writes made before the
    /// walk. `None` once a read-only cursor is exhausted.
    pub fn into_transaction(mut self) -> Option<Transaction> {
        self.transaction.take()
    }

    /// Adapt the cursor into a `Stream`. The stream ends after the last
    /// entry or right after the first error.
    pub fn into_stream(self) -> impl Stream<Item = StoreResult<(u64, Value)>> {
        futures::stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(Some(entry)) => Some((Ok(entry), Some(cursor))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    fn step(&mut self) -> StoreResult<Option<(u64, Value)>> {
        let Some(transaction) = self.transaction.as_mut() else {
            return Ok(None);
        };
        transaction.ensure_active()?;

        let found = transaction
            .view()
            .step(self.position, self.direction)
            .map(|(key, value)| (key, value.clone()));

        match found {
            Some((key, value)) => {
                self.position = Some(key);
                Ok(Some((key, value)))
            }
            None => {
                if transaction.mode() == TransactionMode::ReadOnly {
                    transaction.complete();
                    self.transaction = None;
                }
                Ok(None)
            }
        }
    }
}
