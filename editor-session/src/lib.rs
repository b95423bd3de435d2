//! Editing session coordinator for remotely stored text files.
//!
//! Keeps a local text surface and a remote file store consistent under
//! concurrent user edits, periodic autosave, explicit saves and file
//! switches.

pub mod config;
pub mod observer;
pub mod session;
pub mod store;
pub mod surface;
pub mod target;

pub use config::SessionConfig;
pub use observer::{ChannelObserver, LoggingObserver, SessionEvent, SessionObserver};
pub use session::{
    EditorSession, FlushOutcome, LoadError, SaveError, SessionError, SessionHandle,
    SessionStatus, SwitchOutcome,
};
pub use store::{HttpFileStore, RemoteFileStore, StoreError};
pub use surface::{BufferSurface, TextSurface, LOAD_ERROR_PLACEHOLDER};
pub use target::{Generation, Target};
