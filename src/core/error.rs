use thiserror::Error;

/// Errors surfaced by the gateway and the application controller.
///
/// Each variant corresponds to one failure class of the memo flow:
/// connection problems are fatal, everything else is recoverable.
#[derive(Error, Debug)]
pub enum MemoError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl MemoError {
    pub fn write(err: impl std::fmt::Display) -> Self {
        Self::Write(err.to_string())
    }

    pub fn read(err: impl std::fmt::Display) -> Self {
        Self::Read(err.to_string())
    }

    /// Fatal errors stop all further store interaction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, MemoError>;

impl<T> From<std::sync::PoisonError<T>> for MemoError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
