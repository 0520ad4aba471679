//! Live state of open databases.
//!
//! Every connection to the same database on the same backend location works
//! on the same per-store locks, so key generators and committed records are
//! shared instead of copied per connection.

use super::error::StoreResult;
use super::object_store::ObjectStoreData;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

pub type SharedStore = Arc<RwLock<ObjectStoreData>>;

/// Schema version and store handles of one open database
#[derive(Debug)]
pub struct LiveDatabase {
    pub version: u32,
    pub stores: HashMap<String, SharedStore>,
}

/// Open databases of one backend location.
///
/// `opening` serializes open and upgrade requests against the location;
/// `databases` maps database names to their live state.
#[derive(Debug, Default)]
pub struct LiveDatabases {
    opening: tokio::sync::Mutex<()>,
    databases: Mutex<HashMap<String, Arc<LiveDatabase>>>,
}

impl LiveDatabases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold while loading, upgrading and registering a database
    pub async fn lock_opening(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.opening.lock().await
    }

    pub fn get(&self, name: &str) -> StoreResult<Option<Arc<LiveDatabase>>> {
        Ok(self.databases.lock()?.get(name).cloned())
    }

    pub fn insert(&self, name: &str, database: Arc<LiveDatabase>) -> StoreResult<()> {
        self.databases.lock()?.insert(name.to_string(), database);
        Ok(())
    }

    pub fn names(&self) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self.databases.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::object_store::StoreOptions;

    #[test]
    fn test_registered_database_is_shared() {
        let registry = LiveDatabases::new();
        assert!(registry.get("memo").unwrap().is_none());

        let mut stores = HashMap::new();
        stores.insert(
            "memoes".to_string(),
            Arc::new(RwLock::new(ObjectStoreData::new("memoes", StoreOptions::new()))),
        );
        let live = Arc::new(LiveDatabase { version: 1, stores });
        registry.insert("memo", Arc::clone(&live)).unwrap();

        let found = registry.get("memo").unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &live));
        assert!(Arc::ptr_eq(&found.stores["memoes"], &live.stores["memoes"]));
        assert_eq!(registry.names().unwrap(), vec!["memo".to_string()]);
    }
}
