use crate::core::RecordId;

/// User actions delivered to the controller's event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// The save button was activated
    Save,
    /// A card's delete control was activated
    Delete(RecordId),
}
