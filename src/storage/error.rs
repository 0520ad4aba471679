use crate::transaction::TransactionId;
use thiserror::Error;

/// Errors raised by the local store engine.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid version {0}: versions start at 1")]
    InvalidVersion(u32),

    #[error("Database '{name}' is at version {current}, cannot open it at version {requested}")]
    VersionError {
        name: String,
        current: u32,
        requested: u32,
    },

    #[error("Object store '{0}' already exists")]
    StoreExists(String),

    #[error("Object store '{0}' not found")]
    StoreNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Quota exceeded: object store '{store}' holds at most {limit} records")]
    QuotaExceeded { store: String, limit: usize },

    #[error("Transaction {0} is not active")]
    TransactionInactive(TransactionId),

    #[error("Transaction {0} is read-only")]
    ReadOnly(TransactionId),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
