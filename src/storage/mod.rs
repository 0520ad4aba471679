//! Local store engine: named, versioned databases of object stores with an
//! auto-increment key generator, scoped transactions and cursors.

pub mod backend;
pub mod database;
pub mod error;
pub mod object_store;
pub mod persistence;
pub mod registry;

pub use backend::{DatabaseImage, MemoryBackend, StorageBackend, UnavailableBackend};
pub use database::{Database, OpenRequest, UpgradeContext};
pub use error::{StoreError, StoreResult};
pub use object_store::{CursorDirection, ObjectStoreData, StoreOptions};
pub use persistence::FileBackend;
pub use registry::{LiveDatabase, LiveDatabases};
