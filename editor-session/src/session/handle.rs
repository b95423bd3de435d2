//! Caller-facing API over the session actor.

use ractor::{Actor, ActorRef};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::observer::SessionObserver;
use crate::session::actor::{EditorSessionActor, EditorSessionArguments};
use crate::session::protocol::{
    EditorSessionMsg, FlushOutcome, SessionError, SessionStatus, SwitchOutcome,
};
use crate::store::RemoteFileStore;
use crate::surface::TextSurface;
use crate::target::{Generation, Target};

/// Entry point for spawning editing sessions.
pub struct EditorSession;

impl EditorSession {
    /// Spawn a session actor. The join handle completes once the session
    /// has been disposed.
    pub async fn start(
        config: &SessionConfig,
        store: Arc<dyn RemoteFileStore>,
        surface: Arc<dyn TextSurface>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<(SessionHandle, JoinHandle<()>), SessionError> {
        let args = EditorSessionArguments {
            store,
            surface,
            observer,
            autosave_interval: config.autosave_interval,
            request_timeout: config.request_timeout,
        };
        let name = format!("editor_session:{}", ulid::Ulid::new());
        let (actor, join) = Actor::spawn(Some(name), EditorSessionActor, args)
            .await
            .map_err(|e| SessionError::Unavailable(e.to_string()))?;
        Ok((SessionHandle { actor }, join))
    }
}

/// Cloneable handle to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    actor: ActorRef<EditorSessionMsg>,
}

impl SessionHandle {
    pub fn actor(&self) -> &ActorRef<EditorSessionMsg> {
        &self.actor
    }

    /// Flush the current target, then bind and load `project/path`.
    pub async fn select_target(
        &self,
        project: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<SwitchOutcome, SessionError> {
        let target = Target::new(project, path);
        let outcome = ractor::call!(self.actor, |reply| EditorSessionMsg::SelectTarget {
            target,
            reply
        })
        .map_err(unavailable)?;
        Ok(outcome?)
    }

    pub async fn flush(&self) -> Result<FlushOutcome, SessionError> {
        let outcome = ractor::call!(self.actor, |reply| EditorSessionMsg::Flush { reply })
            .map_err(unavailable)?;
        Ok(outcome?)
    }

    /// Explicit save command: writes the current content even if clean.
    pub async fn force_save(&self) -> Result<FlushOutcome, SessionError> {
        let outcome = ractor::call!(self.actor, |reply| EditorSessionMsg::ForceSave { reply })
            .map_err(unavailable)?;
        Ok(outcome?)
    }

    /// Report a user edit made while `generation` was bound.
    pub fn notify_edit(&self, generation: Generation) -> Result<(), SessionError> {
        self.actor
            .cast(EditorSessionMsg::Edited { generation })
            .map_err(unavailable)
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        ractor::call!(self.actor, |reply| EditorSessionMsg::GetStatus { reply })
            .map_err(unavailable)
    }

    /// Final flush, then stop the session. The flush outcome is returned
    /// even though the session is gone afterwards.
    pub async fn dispose(&self) -> Result<FlushOutcome, SessionError> {
        let outcome = ractor::call!(self.actor, |reply| EditorSessionMsg::Dispose { reply })
            .map_err(unavailable)?;
        Ok(outcome?)
    }
}

fn unavailable(e: impl std::fmt::Display) -> SessionError {
    SessionError::Unavailable(e.to_string())
}
