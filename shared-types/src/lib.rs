//! Shared types between the file server and editing clients
//!
//! These types are used by both:
//! - the file server HTTP handlers (native Rust)
//! - editing clients: the session coordinator and the browser front end
//!
//! Serializable with serde for JSON over HTTP. Field names are camelCase on
//! the wire to match the browser client.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Files
// ============================================================================

/// Query string for `GET /files`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "nora.ts")]
pub struct FileQuery {
    pub project_name: String,
    pub path: String,
}

/// Body returned by `GET /files`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "nora.ts")]
pub struct FileContent {
    pub content: String,
}

/// Body of `POST /files/update` - whole-file overwrite
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "nora.ts")]
pub struct UpdateFileRequest {
    pub project_name: String,
    pub path: String,
    pub content: String,
}

/// Body of `POST /files` and `POST /folders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "nora.ts")]
pub struct CreateEntryRequest {
    pub project_name: String,
    pub path: String,
}

/// Success body for mutating file endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "nora.ts")]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Projects
// ============================================================================

/// Project metadata, stored as `nora.json` in the project directory and
/// returned by `GET /projects`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "nora.ts")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Local creation date, `YYYY-MM-DD`
    pub created_at: String,
}

/// Body of `POST /projects`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "nora.ts")]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    #[ts(optional)]
    pub description: Option<String>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error body returned with every non-2xx response.
///
/// `error` carries the human-readable message clients surface to users,
/// `code` is machine-readable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "nora.ts")]
pub struct ErrorBody {
    pub status: u16,
    pub code: String,
    pub error: String,
}
