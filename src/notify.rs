//! Ephemeral notifications with a debounced auto-dismiss.
//!
//! At most one notification and one pending dismissal exist at any time.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// How long it stays visible unless replaced or cleared first.
    pub duration: Duration,
}

#[derive(Default)]
struct Pending {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Notification sink. Must be used inside a tokio runtime.
#[derive(Clone)]
pub struct Notifier {
    state: watch::Sender<Option<Notification>>,
    pending: Arc<Mutex<Pending>>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Shows `message`, replacing any current notification and its timer.
    pub fn show(&self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);
        let generation = pending.generation;

        self.state.send_replace(Some(Notification {
            message: message.into(),
            severity,
            duration,
        }));

        let state = self.state.clone();
        let shared = Arc::clone(&self.pending);
        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let mut pending = shared.lock().unwrap_or_else(PoisonError::into_inner);
            // A newer show() or clear() owns the slot now.
            if pending.generation == generation {
                pending.timer = None;
                state.send_replace(None);
            }
        }));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(message, Severity::Success, DEFAULT_DURATION);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(message, Severity::Error, DEFAULT_DURATION);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.show(message, Severity::Info, DEFAULT_DURATION);
    }

    /// Cancels the pending dismissal and blanks the notification. Idempotent.
    pub fn clear(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation = pending.generation.wrapping_add(1);
        self.state.send_replace(None);
    }

    #[must_use]
    pub fn current(&self) -> Option<Notification> {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.state.subscribe()
    }
}
