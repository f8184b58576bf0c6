//! Trailing-edge debouncing for text entry
//!
//! Every keystroke updates the bound field value immediately; only the commit
//! to the selection is delayed until the field has been quiet for the
//! configured period. Each new edit cancels and restarts the timer.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Overlay text fields that debounce their commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Top,
    Bottom,
}

/// A debounced value ready to be applied to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCommit {
    pub field: TextField,
    pub value: String,
    /// Input epoch the edit was made in; a reset starts a new one
    pub epoch: u64,
}

/// Emits only the last value pushed within a quiet window
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { quiet, pending: None, tx }, rx)
    }

    /// Schedule `value`, replacing anything still waiting. Must be called
    /// from within a tokio runtime.
    pub fn push(&mut self, value: T) {
        self.cancel();
        let tx = self.tx.clone();
        let quiet = self.quiet;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            let _ = tx.send(value);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Bound text inputs plus one debouncer per field
pub struct TextInputs {
    top: String,
    bottom: String,
    top_debouncer: Debouncer<TextCommit>,
    bottom_debouncer: Debouncer<TextCommit>,
    epoch: u64,
}

impl TextInputs {
    /// Both fields share one commit stream
    pub fn new(quiet: Duration) -> (Self, mpsc::UnboundedReceiver<TextCommit>) {
        let (top_debouncer, rx) = Debouncer::new(quiet);
        let bottom_debouncer = Debouncer {
            quiet,
            pending: None,
            tx: top_debouncer.tx.clone(),
        };
        let inputs = Self {
            top: String::new(),
            bottom: String::new(),
            top_debouncer,
            bottom_debouncer,
            epoch: 0,
        };
        (inputs, rx)
    }

    /// Record an input event and (re)start that field's quiet timer
    pub fn input(&mut self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        debug!("⌨️ {:?} text input ({} chars)", field, value.len());
        let commit = TextCommit { field, value: value.clone(), epoch: self.epoch };
        match field {
            TextField::Top => {
                self.top = value;
                self.top_debouncer.push(commit);
            }
            TextField::Bottom => {
                self.bottom = value;
                self.bottom_debouncer.push(commit);
            }
        }
    }

    pub fn value(&self, field: TextField) -> &str {
        match field {
            TextField::Top => &self.top,
            TextField::Bottom => &self.bottom,
        }
    }

    /// Commits that fired before the last reset are stale
    pub fn is_current(&self, commit: &TextCommit) -> bool {
        commit.epoch == self.epoch
    }

    /// Drop pending commits and blank both fields. Commits already fired
    /// but not yet applied become stale.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.top_debouncer.cancel();
        self.bottom_debouncer.cancel();
        self.top.clear();
        self.bottom.clear();
    }
}
