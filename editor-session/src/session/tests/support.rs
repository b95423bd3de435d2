use async_trait::async_trait;
use ractor::concurrency::{oneshot, OneshotReceiver};
use ractor::RpcReplyPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::observer::{ChannelObserver, SessionEvent};
use crate::session::{
    EditorSession, EditorSessionMsg, SessionHandle, SessionStatus, SwitchOutcome,
};
use crate::store::{RemoteFileStore, StoreError};
use crate::surface::{BufferSurface, TextSurface};
use crate::target::{Generation, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    Load(Target),
    Save(Target, String),
}

pub(crate) fn load(path: &str) -> StoreCall {
    StoreCall::Load(Target::new("proj1", path))
}

pub(crate) fn save(path: &str, content: &str) -> StoreCall {
    StoreCall::Save(Target::new("proj1", path), content.to_string())
}

/// In-memory store that records every call in issue order. Saves and
/// individual loads can be held until the test releases them.
#[derive(Default)]
pub(crate) struct ScriptedStore {
    files: Mutex<HashMap<Target, String>>,
    calls: Mutex<Vec<StoreCall>>,
    completed_loads: Mutex<Vec<Target>>,
    save_gate: Mutex<Option<Arc<Semaphore>>>,
    load_gates: Mutex<HashMap<Target, Arc<Semaphore>>>,
    fail_saves: AtomicBool,
}

impl ScriptedStore {
    pub(crate) fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.files.lock().unwrap();
            for (path, content) in files {
                map.insert(Target::new("proj1", *path), content.to_string());
            }
        }
        Arc::new(store)
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn save_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, StoreCall::Save(..)))
            .count()
    }

    pub(crate) fn file(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(&Target::new("proj1", path))
            .cloned()
    }

    /// Saves block until `release_save` hands out a permit.
    pub(crate) fn hold_saves(&self) {
        *self.save_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub(crate) fn release_save(&self) {
        if let Some(gate) = self.save_gate.lock().unwrap().as_ref() {
            gate.add_permits(1);
        }
    }

    pub(crate) fn hold_load(&self, path: &str) {
        self.load_gates
            .lock()
            .unwrap()
            .insert(Target::new("proj1", path), Arc::new(Semaphore::new(0)));
    }

    pub(crate) fn release_load(&self, path: &str) {
        if let Some(gate) = self.load_gates.lock().unwrap().get(&Target::new("proj1", path)) {
            gate.add_permits(1);
        }
    }

    pub(crate) fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub(crate) async fn wait_for_calls(&self, n: usize) {
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            while self.calls.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            reached.is_ok(),
            "expected {n} store calls, got {:?}",
            self.calls()
        );
    }

    pub(crate) async fn wait_for_completed_load(&self, path: &str) {
        let target = Target::new("proj1", path);
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            while !self.completed_loads.lock().unwrap().contains(&target) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok(), "load of {target} never completed");
    }
}

#[async_trait]
impl RemoteFileStore for ScriptedStore {
    async fn load(&self, target: &Target) -> Result<String, StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Load(target.clone()));

        let gate = self.load_gates.lock().unwrap().get(target).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        let content = self.files.lock().unwrap().get(target).cloned();
        self.completed_loads.lock().unwrap().push(target.clone());
        content.ok_or_else(|| StoreError::Status {
            status: 404,
            message: "File not found".to_string(),
        })
    }

    async fn save(&self, target: &Target, content: &str) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Save(target.clone(), content.to_string()));

        let gate = self.save_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 500,
                message: "disk full".to_string(),
            });
        }
        self.files
            .lock()
            .unwrap()
            .insert(target.clone(), content.to_string());
        Ok(())
    }
}

pub(crate) struct TestSession {
    pub handle: SessionHandle,
    pub join: JoinHandle<()>,
    pub surface: BufferSurface,
    pub store: Arc<ScriptedStore>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

pub(crate) fn test_config() -> SessionConfig {
    SessionConfig {
        backend_url: "http://unused".to_string(),
        autosave_interval: None,
        request_timeout: Duration::from_secs(2),
    }
}

pub(crate) async fn start_session(store: Arc<ScriptedStore>) -> TestSession {
    start_session_with(store, test_config()).await
}

pub(crate) async fn start_session_with(
    store: Arc<ScriptedStore>,
    config: SessionConfig,
) -> TestSession {
    let surface = BufferSurface::default();
    let (observer, events) = ChannelObserver::new();
    let (handle, join) = EditorSession::start(
        &config,
        store.clone(),
        Arc::new(surface.clone()),
        Arc::new(observer),
    )
    .await
    .unwrap();
    TestSession {
        handle,
        join,
        surface,
        store,
        events,
    }
}

impl TestSession {
    /// Select `proj1/<path>` and expect it to load.
    pub(crate) async fn open(&self, path: &str) -> Generation {
        match self.handle.select_target("proj1", path).await.unwrap() {
            SwitchOutcome::Loaded { generation, .. } => generation,
            other => panic!("expected Loaded for {path}, got {other:?}"),
        }
    }

    /// Replace the buffer as a user would and report the edit.
    pub(crate) fn type_text(&self, generation: Generation, text: &str) {
        self.surface.set_value(text);
        self.handle.notify_edit(generation).unwrap();
    }

    /// Enqueue a request without waiting for its reply. The message is in
    /// the mailbox when this returns.
    pub(crate) fn send<T>(
        &self,
        build: impl FnOnce(RpcReplyPort<T>) -> EditorSessionMsg,
    ) -> OneshotReceiver<T> {
        let (tx, rx) = oneshot();
        self.handle.actor().cast(build(tx.into())).unwrap();
        rx
    }

    /// Round-trips through the mailbox, so every earlier message has been
    /// handled when it returns.
    pub(crate) async fn status(&self) -> SessionStatus {
        self.handle.status().await.unwrap()
    }

    pub(crate) async fn wait_until_idle(&self) -> SessionStatus {
        let status = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let status = self.status().await;
                if !status.saving && !status.loading {
                    return status;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        status.expect("session never became idle")
    }

    pub(crate) fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
