use crate::app::UiEvent;
use crate::core::{Record, RecordId};
use tokio::sync::mpsc::UnboundedSender;

pub const DELETE_LABEL: &str = "Delete";

/// Delete button of one card. Bound to the card's identity when the card
/// is built; activating it asks the controller to delete exactly that
/// record.
#[derive(Clone)]
pub struct DeleteControl {
    id: RecordId,
    events: UnboundedSender<UiEvent>,
}

impl DeleteControl {
    pub fn new(id: RecordId, events: UnboundedSender<UiEvent>) -> Self {
        Self { id, events }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        DELETE_LABEL
    }

    /// Returns false when nothing listens for UI events anymore.
    pub fn activate(&self) -> bool {
        self.events.send(UiEvent::Delete(self.id)).is_ok()
    }
}

impl std::fmt::Debug for DeleteControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteControl").field("id", &self.id).finish()
    }
}

/// Display unit for one memo
#[derive(Debug, Clone)]
pub struct Card {
    id: RecordId,
    header: String,
    title: String,
    text: String,
    footer: String,
    delete: DeleteControl,
}

impl Card {
    pub fn from_record(record: &Record, delete: DeleteControl) -> Self {
        Self {
            id: record.id,
            header: format!("ID: {}", record.id),
            title: record.title.clone(),
            text: record.body.clone(),
            footer: record.write_date.clone(),
            delete,
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    pub fn delete_control(&self) -> &DeleteControl {
        &self.delete
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌ {}", self.header)?;
        writeln!(f, "│ {}", self.title)?;
        for line in self.text.lines() {
            writeln!(f, "│   {}", line)?;
        }
        write!(f, "└ {} [{}]", self.footer, self.delete.label())
    }
}
