//! EditorSessionActor message protocol
//!
//! Defines the messages the session actor handles, the outcomes returned to
//! callers and the error taxonomy surfaced to observers.

use chrono::{DateTime, Utc};
use ractor::RpcReplyPort;
use serde::Serialize;

use crate::store::StoreError;
use crate::target::{Generation, Target};

/// Messages handled by EditorSessionActor
#[derive(Debug)]
pub enum EditorSessionMsg {
    /// Flush the current target, then bind and load a new one
    SelectTarget {
        target: Target,
        reply: RpcReplyPort<Result<SwitchOutcome, LoadError>>,
    },
    /// The text surface reported a user edit made while `generation` was bound
    Edited { generation: Generation },
    /// Save pending edits, if any
    Flush {
        reply: RpcReplyPort<Result<FlushOutcome, SaveError>>,
    },
    /// Explicit save command (hotkey): writes even when nothing is dirty
    ForceSave {
        reply: RpcReplyPort<Result<FlushOutcome, SaveError>>,
    },
    /// Periodic autosave trigger
    AutosaveTick,
    /// Snapshot of the session state
    GetStatus { reply: RpcReplyPort<SessionStatus> },
    /// Final flush, then stop the session
    Dispose {
        reply: RpcReplyPort<Result<FlushOutcome, SaveError>>,
    },
    /// Completion of a spawned save request
    SaveSettled {
        ticket: u64,
        result: Result<(), StoreError>,
    },
    /// Completion of a spawned load request
    LoadSettled {
        generation: Generation,
        result: Result<String, StoreError>,
    },
}

/// Result of a flush request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// The content the caller cared about is durably stored
    Acknowledged,
    /// Nothing to save; no request was made on the caller's behalf
    Skipped,
}

/// Result of a target switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The target's content is on the surface and the session is clean
    Loaded {
        target: Target,
        generation: Generation,
    },
    /// A newer switch (or dispose) replaced this one before it completed
    Superseded { target: Target },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to save {target}: {source}")]
pub struct SaveError {
    pub target: Target,
    pub source: StoreError,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load {target}: {source}")]
pub struct LoadError {
    pub target: Target,
    pub source: StoreError,
}

/// Everything an observer or handle caller can be told about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Save(#[from] SaveError),

    /// The session actor is gone (disposed or crashed)
    #[error("editing session unavailable: {0}")]
    Unavailable(String),
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub target: Option<Target>,
    pub generation: Generation,
    pub dirty: bool,
    pub saving: bool,
    pub loading: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}
