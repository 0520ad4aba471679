//! Application controller and the UI surfaces it drives.

pub mod controller;
pub mod event;
pub mod surface;

pub use controller::{
    MSG_CONNECTION_FAILED, MSG_DELETE_FAILED, MSG_EMPTY_INPUT, MSG_LOAD_FAILED, MSG_SAVE_FAILED,
    MSG_STORAGE_UNSUPPORTED, MemoApp,
};
pub use event::UiEvent;
pub use surface::{AlertLog, CaptureSurface, InputFields, Notifier};
