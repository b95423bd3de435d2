//! Target switching: latest-wins bookkeeping for queued and loading switches.

use crate::target::{Generation, Target};

/// A switch whose load request is outstanding.
#[derive(Debug)]
pub struct LoadingSwitch<R> {
    pub generation: Generation,
    pub target: Target,
    pub responder: R,
}

/// Tracks at most one switch waiting for the old target's flush to settle
/// and at most one switch waiting for its load. A newer request replaces
/// an older one in either slot; the replaced responder is handed back.
#[derive(Debug)]
pub struct SwitchController<R> {
    queued: Option<(Target, R)>,
    loading: Option<LoadingSwitch<R>>,
}

impl<R> Default for SwitchController<R> {
    fn default() -> Self {
        Self {
            queued: None,
            loading: None,
        }
    }
}

impl<R> SwitchController<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_queued(&self) -> bool {
        self.queued.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Park a switch until the outgoing flush settles.
    pub fn queue(&mut self, target: Target, responder: R) -> Option<(Target, R)> {
        self.queued.replace((target, responder))
    }

    pub fn take_queued(&mut self) -> Option<(Target, R)> {
        self.queued.take()
    }

    /// Record a load for `generation`. Returns the load it supersedes.
    pub fn begin_load(
        &mut self,
        generation: Generation,
        target: Target,
        responder: R,
    ) -> Option<LoadingSwitch<R>> {
        self.loading.replace(LoadingSwitch {
            generation,
            target,
            responder,
        })
    }

    /// Claim the outstanding load if `generation` is the one it was issued
    /// for. A mismatch means the result is stale and must be discarded.
    pub fn accept(&mut self, generation: Generation) -> Option<LoadingSwitch<R>> {
        match &self.loading {
            Some(loading) if loading.generation == generation => self.loading.take(),
            _ => None,
        }
    }

    pub fn take_loading(&mut self) -> Option<LoadingSwitch<R>> {
        self.loading.take()
    }
}
