pub mod gateway;

pub use gateway::{Ready, RecordCursor, RecordStoreGateway};
