//! Projects API endpoints
//!
//! A project is a directory directly under the server root that holds a
//! `nora.json` metadata file. Files are only editable inside an existing
//! project.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_types::{CreateProjectRequest, Project};
use tokio::fs;

use crate::api::files::{bad_json, file_error, validate_project, FileErrorCode};
use crate::api::ApiState;

const METADATA_FILE: &str = "nora.json";

/// Folders every new project starts with
const PROJECT_SUBDIRS: [&str; 4] = ["objects", "scenes", "scripts", "reports"];

/// List the metadata of every project under the root, sorted by name.
/// Directories without a readable `nora.json` are skipped.
pub async fn list_projects(State(state): State<ApiState>) -> Response {
    let root = state.app_state.root();
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::OK, Json(Vec::<Project>::new())).into_response();
        }
        Err(e) => {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to open projects directory: {e}"),
            );
        }
    };

    let mut projects = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return file_error(
                    FileErrorCode::InternalError,
                    format!("Failed to read projects directory: {e}"),
                );
            }
        };
        if !entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            continue;
        }

        let metadata_path = entry.path().join(METADATA_FILE);
        let Ok(raw) = fs::read_to_string(&metadata_path).await else {
            continue;
        };
        match serde_json::from_str::<Project>(&raw) {
            Ok(project) => projects.push(project),
            Err(e) => tracing::warn!(
                path = %metadata_path.display(),
                error = %e,
                "skipping unreadable project metadata"
            ),
        }
    }

    projects.sort_by(|a, b| a.name.cmp(&b.name));
    (StatusCode::OK, Json(projects)).into_response()
}

/// Create a project directory with its metadata and starter folders
pub async fn create_project(
    State(state): State<ApiState>,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };

    let Ok(name) = validate_project(&req.name) else {
        return file_error(
            FileErrorCode::InvalidRequest,
            "Missing or invalid 'name' field",
        );
    };
    let project_dir = state.app_state.root().join(name);

    if fs::symlink_metadata(&project_dir).await.is_ok() {
        return file_error(
            FileErrorCode::AlreadyExists,
            format!("Project already exists: {name}"),
        );
    }

    for subdir in PROJECT_SUBDIRS {
        if let Err(e) = fs::create_dir_all(project_dir.join(subdir)).await {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to create project directory: {e}"),
            );
        }
    }

    let project = Project {
        name: name.to_string(),
        description: req.description.unwrap_or_default(),
        created_at: chrono::Local::now().format("%Y-%m-%d").to_string(),
    };
    let metadata = match serde_json::to_string_pretty(&project) {
        Ok(json) => json,
        Err(e) => {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to encode project metadata: {e}"),
            );
        }
    };
    if let Err(e) = fs::write(project_dir.join(METADATA_FILE), metadata).await {
        return file_error(
            FileErrorCode::InternalError,
            format!("Failed to create project file: {e}"),
        );
    }

    tracing::info!(project = %project.name, "project created");
    (StatusCode::CREATED, Json(project)).into_response()
}
