//! Dirty tracking for the bound target.

use crate::target::Generation;

/// "Unsaved edits exist for the current binding", plus the counters that
/// let asynchronous completions tell whether they are still relevant.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    generation: Generation,
    dirty: bool,
    /// Incremented on every accepted edit notification.
    version: u64,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record an edit made while `generation` was bound. Edits from a
    /// superseded binding are ignored. Returns true if the flag flipped.
    pub fn mark_dirty(&mut self, generation: Generation) -> bool {
        if generation != self.generation {
            return false;
        }
        self.version += 1;
        !std::mem::replace(&mut self.dirty, true)
    }

    /// Set the flag without an edit (explicit save command).
    pub fn force_dirty(&mut self) -> bool {
        !std::mem::replace(&mut self.dirty, true)
    }

    /// Returns true if the flag flipped.
    pub fn mark_clean(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// A save of content taken at `version` was acknowledged. Clean only if
    /// no edit arrived after that snapshot.
    pub fn acknowledge(&mut self, version: u64) -> bool {
        if version != self.version {
            return false;
        }
        self.mark_clean()
    }

    /// Start a new binding: next generation, clean.
    pub fn rebind(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.dirty = false;
        self.generation
    }
}
