//! Text surface seam.
//!
//! The surface displays editable text and owns no persistence logic. Edits
//! are reported to the session through `SessionHandle::notify_edit`.

use std::sync::{Arc, RwLock};

/// Placeholder shown when a file fails to load
pub const LOAD_ERROR_PLACEHOLDER: &str = "// Error loading file";

pub trait TextSurface: Send + Sync + 'static {
    /// Current text (getValue)
    fn value(&self) -> String;

    /// Replace the whole text (setValue).
    ///
    /// Programmatic replacement must not be reported as a user edit.
    fn set_value(&self, content: &str);
}

/// In-memory surface shared between a front end and the session.
#[derive(Debug, Clone, Default)]
pub struct BufferSurface {
    text: Arc<RwLock<String>>,
}

impl BufferSurface {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            text: Arc::new(RwLock::new(initial.into())),
        }
    }

    /// Mutate the buffer in place. Callers report the edit separately.
    pub fn edit<F>(&self, f: F)
    where
        F: FnOnce(&mut String),
    {
        let mut guard = self
            .text
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard);
    }
}

impl TextSurface for BufferSurface {
    fn value(&self) -> String {
        self.text
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_value(&self, content: &str) {
        self.edit(|text| {
            text.clear();
            text.push_str(content);
        });
    }
}
