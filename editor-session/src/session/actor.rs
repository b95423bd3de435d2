//! EditorSessionActor - owns the single active editing session
//!
//! The actor mailbox is the session's event queue. Store calls run on
//! spawned tasks and report back with `SaveSettled` / `LoadSettled`, so
//! edits, ticks and switch requests keep flowing while a request is out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::observer::SessionObserver;
use crate::session::autosave::AutosaveScheduler;
use crate::session::dirty::DirtyTracker;
use crate::session::protocol::{
    EditorSessionMsg, FlushOutcome, LoadError, SaveError, SessionError, SessionStatus,
    SwitchOutcome,
};
use crate::session::save::{FlushDecision, PendingSave, SaveCoordinator};
use crate::session::switch::SwitchController;
use crate::store::{RemoteFileStore, StoreError};
use crate::surface::{TextSurface, LOAD_ERROR_PLACEHOLDER};
use crate::target::{Generation, Target};

type FlushReply = RpcReplyPort<Result<FlushOutcome, SaveError>>;
type SwitchReply = RpcReplyPort<Result<SwitchOutcome, LoadError>>;

/// EditorSessionActor - coordinates dirty tracking, saves and switches
#[derive(Debug, Default)]
pub struct EditorSessionActor;

/// Arguments for spawning EditorSessionActor
#[derive(Clone)]
pub struct EditorSessionArguments {
    pub store: Arc<dyn RemoteFileStore>,
    pub surface: Arc<dyn TextSurface>,
    pub observer: Arc<dyn SessionObserver>,
    /// `None` disables periodic autosave
    pub autosave_interval: Option<Duration>,
    /// Upper bound on every load and save request
    pub request_timeout: Duration,
}

/// Internal state for EditorSessionActor
pub struct EditorSessionState {
    store: Arc<dyn RemoteFileStore>,
    surface: Arc<dyn TextSurface>,
    observer: Arc<dyn SessionObserver>,
    request_timeout: Duration,
    target: Option<Target>,
    tracker: DirtyTracker,
    saves: SaveCoordinator<FlushReply>,
    switches: SwitchController<SwitchReply>,
    autosave: Option<AutosaveScheduler>,
    disposing: bool,
    last_saved_at: Option<DateTime<Utc>>,
}

impl EditorSessionState {
    fn status(&self) -> SessionStatus {
        SessionStatus {
            target: self.target.clone(),
            generation: self.tracker.generation(),
            dirty: self.tracker.is_dirty(),
            saving: self.saves.is_saving(),
            loading: self.switches.is_loading(),
            last_saved_at: self.last_saved_at,
        }
    }

    fn set_clean(&mut self) {
        if self.tracker.mark_clean() {
            self.observer.dirty_changed(false);
        }
    }
}

#[async_trait]
impl Actor for EditorSessionActor {
    type Msg = EditorSessionMsg;
    type State = EditorSessionState;
    type Arguments = EditorSessionArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            actor_id = %myself.get_id(),
            autosave_interval = ?args.autosave_interval,
            request_timeout = ?args.request_timeout,
            "EditorSessionActor starting"
        );

        let autosave = args.autosave_interval.map(|period| {
            let tick_ref = myself.clone();
            AutosaveScheduler::start(period, move || {
                tick_ref.cast(EditorSessionMsg::AutosaveTick).is_ok()
            })
        });

        Ok(EditorSessionState {
            store: args.store,
            surface: args.surface,
            observer: args.observer,
            request_timeout: args.request_timeout,
            target: None,
            tracker: DirtyTracker::new(),
            saves: SaveCoordinator::new(),
            switches: SwitchController::new(),
            autosave,
            disposing: false,
            last_saved_at: None,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            EditorSessionMsg::SelectTarget { target, reply } => {
                self.handle_select_target(&myself, state, target, reply);
            }
            EditorSessionMsg::Edited { generation } => {
                self.handle_edited(state, generation);
            }
            EditorSessionMsg::Flush { reply } => {
                self.request_flush(&myself, state, Some(reply));
            }
            EditorSessionMsg::ForceSave { reply } => {
                let loaded =
                    state.target.is_some() && !state.switches.is_loading() && !state.disposing;
                if loaded && state.tracker.force_dirty() {
                    state.observer.dirty_changed(true);
                }
                self.request_flush(&myself, state, Some(reply));
            }
            EditorSessionMsg::AutosaveTick => {
                if !state.disposing {
                    self.request_flush(&myself, state, None);
                }
            }
            EditorSessionMsg::GetStatus { reply } => {
                let _ = reply.send(state.status());
            }
            EditorSessionMsg::Dispose { reply } => {
                self.handle_dispose(&myself, state, reply);
            }
            EditorSessionMsg::SaveSettled { ticket, result } => {
                self.handle_save_settled(&myself, state, ticket, result);
            }
            EditorSessionMsg::LoadSettled { generation, result } => {
                self.handle_load_settled(state, generation, result);
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(mut autosave) = state.autosave.take() {
            autosave.cancel();
        }
        tracing::info!(
            actor_id = %myself.get_id(),
            dirty = state.tracker.is_dirty(),
            "EditorSessionActor stopped"
        );
        Ok(())
    }
}

impl EditorSessionActor {
    fn handle_select_target(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
        target: Target,
        reply: SwitchReply,
    ) {
        if state.disposing {
            let _ = reply.send(Ok(SwitchOutcome::Superseded { target }));
            return;
        }

        let must_flush =
            state.target.is_some() && (state.tracker.is_dirty() || state.saves.is_saving());
        if !must_flush {
            self.begin_switch(myself, state, target, reply);
            return;
        }

        tracing::debug!(
            from = ?state.target.as_ref().map(ToString::to_string),
            to = %target,
            "switch waiting for outgoing flush"
        );
        if let Some((replaced, replaced_reply)) = state.switches.queue(target, reply) {
            let _ = replaced_reply.send(Ok(SwitchOutcome::Superseded { target: replaced }));
        }
        match state
            .saves
            .request(&state.tracker, state.target.as_ref(), None)
        {
            FlushDecision::Started(pending) => self.dispatch_save(myself, state, pending),
            FlushDecision::Joined => {}
            FlushDecision::Skipped(_) => self.after_saves_settled(myself, state),
        }
    }

    /// Rebind to `target` and issue its load. The outgoing target has
    /// already been flushed (or its flush has failed).
    fn begin_switch(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
        target: Target,
        reply: SwitchReply,
    ) {
        let was_dirty = state.tracker.is_dirty();
        let generation = state.tracker.rebind();
        if was_dirty {
            tracing::warn!(
                file = ?state.target.as_ref().map(ToString::to_string),
                "abandoning unsaved edits after failed flush"
            );
            state.observer.dirty_changed(false);
        }

        if let Some(superseded) = state
            .switches
            .begin_load(generation, target.clone(), reply)
        {
            tracing::debug!(
                file = %superseded.target,
                generation = %superseded.generation,
                "load superseded"
            );
            let _ = superseded.responder.send(Ok(SwitchOutcome::Superseded {
                target: superseded.target,
            }));
        }
        state.target = Some(target.clone());

        tracing::info!(file = %target, generation = %generation, "loading target");
        let store = state.store.clone();
        let timeout = state.request_timeout;
        let myself = myself.clone();
        tokio::spawn(async move {
            let result = with_timeout(timeout, store.load(&target)).await;
            let _ = myself.cast(EditorSessionMsg::LoadSettled { generation, result });
        });
    }

    fn handle_load_settled(
        &self,
        state: &mut EditorSessionState,
        generation: Generation,
        result: Result<String, StoreError>,
    ) {
        let Some(loading) = state.switches.accept(generation) else {
            tracing::debug!(generation = %generation, "discarding stale load response");
            return;
        };

        match result {
            Ok(content) => {
                state.surface.set_value(&content);
                state.set_clean();
                tracing::info!(
                    file = %loading.target,
                    generation = %generation,
                    bytes = content.len(),
                    "target loaded"
                );
                state.observer.loaded(&loading.target, generation);
                let _ = loading.responder.send(Ok(SwitchOutcome::Loaded {
                    target: loading.target,
                    generation,
                }));
            }
            Err(source) => {
                state.surface.set_value(LOAD_ERROR_PLACEHOLDER);
                state.set_clean();
                let error = LoadError {
                    target: loading.target,
                    source,
                };
                tracing::warn!(error = %error, "load failed");
                state.observer.error(&SessionError::Load(error.clone()));
                let _ = loading.responder.send(Err(error));
            }
        }
    }

    fn handle_edited(&self, state: &mut EditorSessionState, generation: Generation) {
        if state.target.is_none() || state.disposing || state.switches.is_loading() {
            tracing::trace!(generation = %generation, "edit ignored");
            return;
        }
        if state.tracker.mark_dirty(generation) {
            state.observer.dirty_changed(true);
        }
    }

    fn request_flush(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
        reply: Option<FlushReply>,
    ) {
        match state
            .saves
            .request(&state.tracker, state.target.as_ref(), reply)
        {
            FlushDecision::Started(pending) => self.dispatch_save(myself, state, pending),
            FlushDecision::Joined => {}
            FlushDecision::Skipped(reply) => {
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(FlushOutcome::Skipped));
                }
            }
        }
    }

    /// Snapshot the surface and send it for `pending.target`.
    fn dispatch_save(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &EditorSessionState,
        pending: PendingSave,
    ) {
        let content = state.surface.value();
        tracing::debug!(
            file = %pending.target,
            ticket = pending.ticket,
            version = pending.version,
            bytes = content.len(),
            "saving"
        );

        let store = state.store.clone();
        let timeout = state.request_timeout;
        let myself = myself.clone();
        tokio::spawn(async move {
            let result = with_timeout(timeout, store.save(&pending.target, &content)).await;
            let _ = myself.cast(EditorSessionMsg::SaveSettled {
                ticket: pending.ticket,
                result,
            });
        });
    }

    fn handle_save_settled(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
        ticket: u64,
        result: Result<(), StoreError>,
    ) {
        let keep_flushing = state.disposing || state.switches.has_queued();
        let Some(settlement) =
            state
                .saves
                .settle(&mut state.tracker, ticket, result, keep_flushing)
        else {
            tracing::warn!(ticket, "save result for unknown ticket");
            return;
        };

        match &settlement.outcome {
            Ok(()) => {
                state.last_saved_at = Some(Utc::now());
                tracing::info!(
                    file = %settlement.save.target,
                    version = settlement.save.version,
                    clean = settlement.became_clean,
                    "save acknowledged"
                );
                state.observer.saved(&settlement.save.target);
                if settlement.became_clean {
                    state.observer.dirty_changed(false);
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "save failed");
                state.observer.error(&SessionError::Save(error.clone()));
            }
        }

        for (reply, outcome) in settlement.resolved {
            let _ = reply.send(outcome);
        }

        match settlement.follow_up {
            Some(pending) => self.dispatch_save(myself, state, pending),
            None => self.after_saves_settled(myself, state),
        }
    }

    /// Nothing is in flight: release a queued switch or finish disposing.
    fn after_saves_settled(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
    ) {
        if state.saves.is_saving() {
            return;
        }
        if state.disposing {
            myself.stop(Some("disposed".to_string()));
            return;
        }
        if let Some((target, reply)) = state.switches.take_queued() {
            self.begin_switch(myself, state, target, reply);
        }
    }

    fn handle_dispose(
        &self,
        myself: &ActorRef<EditorSessionMsg>,
        state: &mut EditorSessionState,
        reply: FlushReply,
    ) {
        if !state.disposing {
            tracing::info!(
                file = ?state.target.as_ref().map(ToString::to_string),
                dirty = state.tracker.is_dirty(),
                "disposing editing session"
            );
            state.disposing = true;
            if let Some(mut autosave) = state.autosave.take() {
                autosave.cancel();
            }
            if let Some((target, queued)) = state.switches.take_queued() {
                let _ = queued.send(Ok(SwitchOutcome::Superseded { target }));
            }
            if let Some(loading) = state.switches.take_loading() {
                let _ = loading.responder.send(Ok(SwitchOutcome::Superseded {
                    target: loading.target,
                }));
            }
        }

        match state
            .saves
            .request(&state.tracker, state.target.as_ref(), Some(reply))
        {
            FlushDecision::Started(pending) => self.dispatch_save(myself, state, pending),
            FlushDecision::Joined => {}
            FlushDecision::Skipped(reply) => {
                if let Some(reply) = reply {
                    let _ = reply.send(Ok(FlushOutcome::Skipped));
                }
                myself.stop(Some("disposed".to_string()));
            }
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    request: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(timeout, request)
        .await
        .unwrap_or(Err(StoreError::Timeout(timeout)))
}
