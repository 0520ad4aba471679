//! Card rendering: turns stored memos into display cards and removes them
//! again by identity. No store access happens here.

pub mod card;
pub mod surface;

pub use card::{Card, DELETE_LABEL, DeleteControl};
pub use surface::{CardList, DisplaySurface};

use crate::app::UiEvent;
use crate::core::{Record, RecordId, Result};
use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

/// Renders memos onto a [`DisplaySurface`], newest on top.
#[derive(Debug)]
pub struct RenderSink<D: DisplaySurface> {
    display: D,
    events: UnboundedSender<UiEvent>,
}

impl<D: DisplaySurface> RenderSink<D> {
    /// Cards built by this sink post their delete requests to `events`
    pub fn new(display: D, events: UnboundedSender<UiEvent>) -> Self {
        Self { display, events }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    /// Show `record` as a card at the top of the display
    pub fn render_card(&self, record: &Record) -> Result<()> {
        let control = DeleteControl::new(record.id, self.events.clone());
        self.display
            .insert_front(Card::from_record(record, control))?;
        debug!("card rendered, ID: {}", record.id);
        Ok(())
    }

    /// Remove the card for `id`. A missing card is only reported in the log.
    pub fn remove_card(&self, id: RecordId) -> Result<bool> {
        let removed = self.display.remove(id)?;
        if !removed {
            warn!("ID: {} has no matching card", id);
        }
        Ok(removed)
    }
}
