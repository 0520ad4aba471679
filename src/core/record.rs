//! Memo records as they are stored in and read back from the object store.

use super::error::{MemoError, Result};
use serde::{Deserialize, Serialize};

/// Store-assigned record identity.
///
/// Identities come from the object store's key generator and are never
/// chosen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Get the raw key value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(key: u64) -> Self {
        RecordId(key)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub body: String,
    #[serde(rename = "writeDate")]
    pub write_date: String,
}

/// A memo that has not been stored yet and therefore has no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub title: String,
    pub body: String,
    #[serde(rename = "writeDate")]
    pub write_date: String,
}

impl NewRecord {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        write_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            write_date: write_date.into(),
        }
    }

    /// Reject candidates whose title or body is empty.
    ///
    /// Only exact emptiness counts; whitespace-only input is accepted.
    pub fn validate(&self) -> Result<()> {
        if self.title.is_empty() || self.body.is_empty() {
            return Err(MemoError::Validation(
                "title or text has not been entered".into(),
            ));
        }
        Ok(())
    }
}
