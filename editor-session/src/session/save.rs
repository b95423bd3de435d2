//! Save coordination: at most one outbound write per session.
//!
//! Callers that ask for a flush while a write is in flight join it. Each
//! joiner remembers the content version it wanted saved; when the write
//! settles, joiners covered by the saved snapshot are acknowledged and the
//! rest ride on a single follow-up write of the latest content.

use crate::session::dirty::DirtyTracker;
use crate::session::protocol::{FlushOutcome, SaveError};
use crate::store::StoreError;
use crate::target::{Generation, Target};

/// An in-flight write of the snapshot taken at `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub ticket: u64,
    pub target: Target,
    pub generation: Generation,
    pub version: u64,
}

#[derive(Debug)]
struct Waiter<R> {
    required_version: u64,
    responder: R,
}

#[derive(Debug)]
pub enum FlushDecision<R> {
    /// Clean or unbound; the responder is handed back for a `Skipped` reply
    Skipped(Option<R>),
    /// Attached to the write already in flight
    Joined,
    /// Snapshot the surface and dispatch this write
    Started(PendingSave),
}

#[derive(Debug)]
pub struct Settlement<R> {
    pub save: PendingSave,
    pub outcome: Result<(), SaveError>,
    /// The acknowledgement cleared the dirty flag
    pub became_clean: bool,
    pub resolved: Vec<(R, Result<FlushOutcome, SaveError>)>,
    /// Snapshot the surface and dispatch this write
    pub follow_up: Option<PendingSave>,
}

#[derive(Debug)]
pub struct SaveCoordinator<R> {
    in_flight: Option<PendingSave>,
    waiters: Vec<Waiter<R>>,
    /// A request arrived while a write was in flight
    rerun: bool,
    next_ticket: u64,
}

impl<R> Default for SaveCoordinator<R> {
    fn default() -> Self {
        Self {
            in_flight: None,
            waiters: Vec::new(),
            rerun: false,
            next_ticket: 0,
        }
    }
}

impl<R> SaveCoordinator<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<&PendingSave> {
        self.in_flight.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ask for pending edits on `target` to be saved. `responder` is `None`
    /// for triggers nobody awaits (autosave ticks, switches).
    pub fn request(
        &mut self,
        tracker: &DirtyTracker,
        target: Option<&Target>,
        responder: Option<R>,
    ) -> FlushDecision<R> {
        if self.in_flight.is_some() {
            if let Some(responder) = responder {
                self.waiters.push(Waiter {
                    required_version: tracker.version(),
                    responder,
                });
            }
            self.rerun = true;
            return FlushDecision::Joined;
        }

        let Some(target) = target.filter(|_| tracker.is_dirty()) else {
            return FlushDecision::Skipped(responder);
        };

        let pending = self.issue(tracker, target.clone());
        if let Some(responder) = responder {
            self.waiters.push(Waiter {
                required_version: pending.version,
                responder,
            });
        }
        FlushDecision::Started(pending)
    }

    /// Apply the result of the write identified by `ticket`.
    ///
    /// `keep_flushing` asks for a follow-up whenever the session is still
    /// dirty after a successful write (a switch or dispose is waiting).
    /// Returns `None` for an unknown ticket.
    pub fn settle(
        &mut self,
        tracker: &mut DirtyTracker,
        ticket: u64,
        result: Result<(), StoreError>,
        keep_flushing: bool,
    ) -> Option<Settlement<R>> {
        match &self.in_flight {
            Some(pending) if pending.ticket == ticket => {}
            _ => return None,
        }
        let save = self.in_flight.take()?;
        let rerun = std::mem::take(&mut self.rerun);

        if let Err(source) = result {
            // No automatic retry: every waiter learns about the failure and
            // the flag stays set for the next trigger.
            let error = SaveError {
                target: save.target.clone(),
                source,
            };
            let resolved = self
                .waiters
                .drain(..)
                .map(|w| (w.responder, Err(error.clone())))
                .collect();
            return Some(Settlement {
                save,
                outcome: Err(error),
                became_clean: false,
                resolved,
                follow_up: None,
            });
        }

        let current = save.generation == tracker.generation();
        let became_clean = current && tracker.acknowledge(save.version);

        let (covered, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|w| w.required_version <= save.version);
        let mut resolved: Vec<_> = covered
            .into_iter()
            .map(|w| (w.responder, Ok(FlushOutcome::Acknowledged)))
            .collect();

        let wants_more = rerun || keep_flushing || !waiting.is_empty();
        let follow_up = if current && wants_more && tracker.is_dirty() {
            self.waiters = waiting;
            Some(self.issue(tracker, save.target.clone()))
        } else {
            resolved.extend(
                waiting
                    .into_iter()
                    .map(|w| (w.responder, Ok(FlushOutcome::Skipped))),
            );
            None
        };

        Some(Settlement {
            save,
            outcome: Ok(()),
            became_clean,
            resolved,
            follow_up,
        })
    }

    fn issue(&mut self, tracker: &DirtyTracker, target: Target) -> PendingSave {
        self.next_ticket += 1;
        let pending = PendingSave {
            ticket: self.next_ticket,
            target,
            generation: tracker.generation(),
            version: tracker.version(),
        };
        self.in_flight = Some(pending.clone());
        pending
    }
}
