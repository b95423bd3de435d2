use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    root: PathBuf,
}

impl AppState {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { root: root.into() }),
        }
    }

    /// Directory containing every project
    pub fn root(&self) -> &Path {
        &self.inner.root
    }
}
