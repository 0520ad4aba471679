use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The two input fields of the memo form.
pub trait CaptureSurface: Send + Sync {
    fn title(&self) -> String;
    fn body(&self) -> String;
    /// Empty both fields
    fn clear(&self);
}

/// Blocking, user-visible alerts.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

#[derive(Debug, Default)]
struct Fields {
    title: String,
    body: String,
}

/// In-memory form fields. Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct InputFields {
    fields: Arc<Mutex<Fields>>,
}

impl InputFields {
    pub fn new() -> Self {
        Self::default()
    }

    // Plain strings cannot be left half-written, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, Fields> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }

    pub fn set_body(&self, body: &str) {
        self.lock().body = body.to_string();
    }

    /// Type into both fields
    pub fn fill(&self, title: &str, body: &str) {
        let mut fields = self.lock();
        fields.title = title.to_string();
        fields.body = body.to_string();
    }
}

impl CaptureSurface for InputFields {
    fn title(&self) -> String {
        self.lock().title.clone()
    }

    fn body(&self) -> String {
        self.lock().body.clone()
    }

    fn clear(&self) {
        let mut fields = self.lock();
        fields.title.clear();
        fields.body.clear();
    }
}

/// Notifier that records every alert. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Arc<Mutex<Vec<String>>>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for AlertLog {
    fn alert(&self, message: &str) {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
