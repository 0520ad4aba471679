// ============================================================================
// Transaction Module
// ============================================================================
//
// Transactions scoped to a single object store, plus cursors over them.
//
// Design Patterns Used:
// - State Pattern: Transaction state management (Active, Committed, Aborted)
// - Copy-on-Write: read-write transactions stage writes on a private copy
// - Iterator: cursors step through the store one entry per request
//
// ============================================================================

pub mod cursor;
pub mod state;

pub use cursor::Cursor;
pub use state::{Transaction, TransactionId, TransactionMode, TransactionState};
