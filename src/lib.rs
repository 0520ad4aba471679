// ============================================================================
// memocards Library
// ============================================================================

pub mod app;
pub mod connection;
pub mod core;
pub mod facade;
pub mod render;
pub mod storage;
pub mod transaction;

// Re-export main types for convenience
pub use app::{AlertLog, CaptureSurface, InputFields, MemoApp, Notifier, UiEvent};
pub use connection::StoreConfig;
pub use crate::core::{Clock, FixedClock, MemoError, NewRecord, Record, RecordId, Result, SystemClock};
pub use facade::{Ready, RecordCursor, RecordStoreGateway};
pub use render::{Card, CardList, DeleteControl, DisplaySurface, RenderSink};

// ============================================================================
// Convenience constructors
// ============================================================================

use std::sync::Arc;

/// Memo app over in-memory surfaces
pub type LocalMemoApp = MemoApp<InputFields, CardList, AlertLog>;

/// Build a memo app with in-memory form, card list and alert log.
///
/// The surfaces are shared handles: keep clones to type into the form, read
/// the cards, or inspect alerts.
///
/// # Examples
///
/// ```
/// use memocards::{StoreConfig, UiEvent};
///
/// # #[tokio::main]
/// # async fn main() -> memocards::Result<()> {
/// let (app, _events) = memocards::local_app(StoreConfig::new());
/// app.start().await?;
///
/// app.capture().fill("Groceries", "Milk, eggs");
/// app.dispatch(UiEvent::Save).await?;
///
/// let cards = app.display().ids()?;
/// assert_eq!(cards.len(), 1);
/// # Ok(())
/// # }
/// ```
pub fn local_app(config: StoreConfig) -> (LocalMemoApp, tokio::sync::mpsc::UnboundedReceiver<UiEvent>) {
    let gateway = Arc::new(RecordStoreGateway::new(config));
    MemoApp::new(gateway, InputFields::new(), CardList::new(), AlertLog::new())
}
