//! EditorSessionActor - the editing session coordinator
//!
//! One actor owns the live binding between a target file and the text
//! surface:
//! - Tracks unsaved edits per binding generation
//! - Serializes saves (one in flight) and coalesces flush requests
//! - Drives periodic autosave
//! - Flushes the outgoing file before loading the next one and drops load
//!   responses that belong to a superseded generation
//!
//! ## Switch state machine
//!
//! ```text
//! Bound(A) --select(B)--> [dirty or saving?] --yes--> Flushing(A) --settled--+
//!                                |                                           |
//!                                no                                          |
//!                                v                                           v
//!                           Loading(B, g+1) <--------------------------------+
//!                                |
//!                 load(g+1) ok --+-- load(g+1) failed
//!                       v                  v
//!                   Bound(B)        Bound(B, placeholder)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! let (session, _join) = EditorSession::start(&config, store, surface, observer).await?;
//! if let SwitchOutcome::Loaded { generation, .. } =
//!     session.select_target("proj1", "main.c").await?
//! {
//!     session.notify_edit(generation)?;
//! }
//! session.dispose().await?;
//! ```

pub mod actor;
pub mod autosave;
pub mod dirty;
pub mod handle;
pub mod protocol;
pub mod save;
pub mod switch;

#[cfg(test)]
mod tests;

pub use actor::{EditorSessionActor, EditorSessionArguments, EditorSessionState};
pub use handle::{EditorSession, SessionHandle};
pub use protocol::{
    EditorSessionMsg, FlushOutcome, LoadError, SaveError, SessionError, SessionStatus,
    SwitchOutcome,
};
