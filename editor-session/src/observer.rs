//! Session observers: how the surrounding UI hears about save state.

use tokio::sync::mpsc;

use crate::session::SessionError;
use crate::target::{Generation, Target};

pub trait SessionObserver: Send + Sync + 'static {
    /// The unsaved-edits flag flipped (drives the save-state indicator).
    fn dirty_changed(&self, _dirty: bool) {}

    fn saved(&self, _target: &Target) {}

    fn loaded(&self, _target: &Target, _generation: Generation) {}

    /// Load and save failures. Never fatal to the session.
    fn error(&self, _error: &SessionError) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    DirtyChanged(bool),
    Saved(Target),
    Loaded {
        target: Target,
        generation: Generation,
    },
    Error(SessionError),
}

/// Forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: SessionEvent) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn dirty_changed(&self, dirty: bool) {
        self.emit(SessionEvent::DirtyChanged(dirty));
    }

    fn saved(&self, target: &Target) {
        self.emit(SessionEvent::Saved(target.clone()));
    }

    fn loaded(&self, target: &Target, generation: Generation) {
        self.emit(SessionEvent::Loaded {
            target: target.clone(),
            generation,
        });
    }

    fn error(&self, error: &SessionError) {
        self.emit(SessionEvent::Error(error.clone()));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn dirty_changed(&self, dirty: bool) {
        tracing::debug!(dirty, "save state changed");
    }

    fn saved(&self, target: &Target) {
        tracing::info!(file = %target, "saved");
    }

    fn loaded(&self, target: &Target, generation: Generation) {
        tracing::info!(file = %target, generation = generation.get(), "loaded");
    }

    fn error(&self, error: &SessionError) {
        tracing::warn!(error = %error, "session error");
    }
}
