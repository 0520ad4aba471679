use super::event::UiEvent;
use super::surface::{CaptureSurface, Notifier};
use crate::core::{Clock, MemoError, NewRecord, RecordId, Result, SystemClock, format_timestamp};
use crate::facade::RecordStoreGateway;
use crate::render::{DisplaySurface, RenderSink};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

pub const MSG_STORAGE_UNSUPPORTED: &str = "Local storage is not supported";
pub const MSG_CONNECTION_FAILED: &str = "Failed to connect to the database";
pub const MSG_EMPTY_INPUT: &str = "Title or text has not been entered";
pub const MSG_SAVE_FAILED: &str = "Failed to save the memo";
pub const MSG_DELETE_FAILED: &str = "Failed to delete the memo";
pub const MSG_LOAD_FAILED: &str = "Failed to load memos";

/// Wires the memo form and the card list to the record store.
///
/// A failed open halts the controller: the user is told once and every
/// later save or delete is ignored.
pub struct MemoApp<C, D, N>
where
    C: CaptureSurface,
    D: DisplaySurface,
    N: Notifier,
{
    gateway: Arc<RecordStoreGateway>,
    capture: C,
    sink: RenderSink<D>,
    notifier: N,
    clock: Arc<dyn Clock>,
    events: UnboundedSender<UiEvent>,
    halted: AtomicBool,
}

impl<C, D, N> MemoApp<C, D, N>
where
    C: CaptureSurface,
    D: DisplaySurface,
    N: Notifier,
{
    /// Build the controller together with the receiving end of its event
    /// channel; feed that receiver to [`run`](Self::run).
    pub fn new(
        gateway: Arc<RecordStoreGateway>,
        capture: C,
        display: D,
        notifier: N,
    ) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let app = Self {
            gateway,
            capture,
            sink: RenderSink::new(display, events.clone()),
            notifier,
            clock: Arc::new(SystemClock),
            events,
            halted: AtomicBool::new(false),
        };
        (app, receiver)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn gateway(&self) -> &Arc<RecordStoreGateway> {
        &self.gateway
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub fn display(&self) -> &D {
        self.sink.display()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Sender for the save button to post [`UiEvent::Save`] into
    pub fn events(&self) -> UnboundedSender<UiEvent> {
        self.events.clone()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Open the store and render every stored memo.
    ///
    /// Memos are walked oldest first and each card is put on top, so the
    /// display ends up newest first. Returns the number of cards rendered,
    /// 0 when already halted.
    pub async fn start(&self) -> Result<usize> {
        if self.is_halted() {
            warn!("store is unavailable, start ignored");
            return Ok(0);
        }

        if let Err(err) = self.gateway.open().await {
            self.halt(&err);
            return Err(err);
        }

        let mut cursor = self
            .gateway
            .list_all_ascending()
            .await
            .map_err(|err| self.report(MSG_LOAD_FAILED, err))?;

        let mut rendered = 0;
        while let Some(record) = cursor
            .next()
            .await
            .map_err(|err| self.report(MSG_LOAD_FAILED, err))?
        {
            self.sink.render_card(&record)?;
            rendered += 1;
        }

        info!("loaded {} memo(s)", rendered);
        Ok(rendered)
    }

    /// Save the memo currently typed into the form.
    ///
    /// The form is cleared as soon as the input is accepted, before the
    /// store confirms. Returns the new identity, or `None` when halted.
    pub async fn save(&self) -> Result<Option<RecordId>> {
        if self.is_halted() {
            warn!("store is unavailable, save ignored");
            return Ok(None);
        }

        let write_date = format_timestamp(&self.clock.now(), &self.gateway.config().timestamp_format);
        let candidate = NewRecord::new(self.capture.title(), self.capture.body(), write_date);

        if let Err(err) = candidate.validate() {
            self.notifier.alert(MSG_EMPTY_INPUT);
            self.capture.clear();
            return Err(err);
        }
        self.capture.clear();

        let id = self
            .gateway
            .insert(&candidate)
            .await
            .map_err(|err| self.report(MSG_SAVE_FAILED, err))?;

        match self
            .gateway
            .get_by_identity(id)
            .await
            .map_err(|err| self.report(MSG_LOAD_FAILED, err))?
        {
            Some(record) => self.sink.render_card(&record)?,
            None => warn!("ID: {} was deleted before it could be rendered", id),
        }
        Ok(Some(id))
    }

    /// Delete a memo and its card. Returns whether a card was removed.
    pub async fn delete(&self, id: RecordId) -> Result<bool> {
        if self.is_halted() {
            warn!("store is unavailable, delete of ID: {} ignored", id);
            return Ok(false);
        }

        self.gateway
            .delete_by_identity(id)
            .await
            .map_err(|err| self.report(MSG_DELETE_FAILED, err))?;
        self.sink.remove_card(id)
    }

    /// Handle one UI event
    pub async fn dispatch(&self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::Save => self.save().await.map(|_| ()),
            UiEvent::Delete(id) => self.delete(id).await.map(|_| ()),
        }
    }

    /// Handle UI events until every sender is gone.
    ///
    /// Errors were already reported to the user by the handlers, so they are
    /// only logged here.
    pub async fn run(&self, mut receiver: UnboundedReceiver<UiEvent>) {
        while let Some(event) = receiver.recv().await {
            if let Err(err) = self.dispatch(event).await {
                debug!("{:?} failed: {}", event, err);
            }
        }
    }

    fn halt(&self, err: &MemoError) {
        self.halted.store(true, Ordering::SeqCst);
        let message = match err {
            MemoError::StorageUnavailable(_) => MSG_STORAGE_UNSUPPORTED,
            _ => MSG_CONNECTION_FAILED,
        };
        error!("{}: {}", message, err);
        self.notifier.alert(message);
    }

    fn report(&self, message: &str, err: MemoError) -> MemoError {
        if err.is_fatal() {
            self.halt(&err);
        } else {
            error!("{}: {}", message, err);
            self.notifier.alert(message);
        }
        err
    }
}

impl<C, D, N> std::fmt::Debug for MemoApp<C, D, N>
where
    C: CaptureSurface,
    D: DisplaySurface,
    N: Notifier,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoApp")
            .field("gateway", &self.gateway)
            .field("halted", &self.is_halted())
            .finish()
    }
}
