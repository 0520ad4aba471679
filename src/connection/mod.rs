pub mod config;

pub use config::{
    DEFAULT_DATABASE_NAME, DEFAULT_STORE_NAME, DEFAULT_TIMESTAMP_FORMAT, KEY_PATH, SCHEMA_VERSION,
    StoreConfig,
};
