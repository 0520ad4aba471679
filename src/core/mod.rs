pub mod clock;
pub mod error;
pub mod record;

pub use clock::{Clock, FixedClock, SystemClock, format_timestamp};
pub use error::{MemoError, Result};
pub use record::{NewRecord, Record, RecordId};
