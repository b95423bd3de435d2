//! Files API endpoints
//!
//! Whole-file load, overwrite and creation for project files. Every request
//! names a project and a path relative to that project's directory; paths
//! that would leave the project directory are rejected.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shared_types::{Ack, CreateEntryRequest, ErrorBody, FileContent, UpdateFileRequest};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::api::ApiState;

/// Largest file served or accepted (2MB)
const MAX_FILE_SIZE: u64 = 2 * 1_048_576;

/// Request body limit for `POST /files/update`. JSON escaping can double
/// the size of text content, so this sits well above `MAX_FILE_SIZE`.
pub const UPDATE_BODY_LIMIT: usize = 4 * MAX_FILE_SIZE as usize;

/// File error codes for machine-readable error responses
#[derive(Debug, Clone, Copy)]
pub enum FileErrorCode {
    InvalidRequest,
    PathTraversal,
    NotFound,
    NotAFile,
    NotADirectory,
    AlreadyExists,
    InvalidContent,
    TooLarge,
    InternalError,
}

impl FileErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            FileErrorCode::InvalidRequest => "INVALID_REQUEST",
            FileErrorCode::PathTraversal => "PATH_TRAVERSAL",
            FileErrorCode::NotFound => "NOT_FOUND",
            FileErrorCode::NotAFile => "NOT_A_FILE",
            FileErrorCode::NotADirectory => "NOT_A_DIRECTORY",
            FileErrorCode::AlreadyExists => "ALREADY_EXISTS",
            FileErrorCode::InvalidContent => "INVALID_CONTENT",
            FileErrorCode::TooLarge => "TOO_LARGE",
            FileErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            FileErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            FileErrorCode::PathTraversal => StatusCode::FORBIDDEN,
            FileErrorCode::NotFound => StatusCode::NOT_FOUND,
            FileErrorCode::NotAFile => StatusCode::BAD_REQUEST,
            FileErrorCode::NotADirectory => StatusCode::BAD_REQUEST,
            FileErrorCode::AlreadyExists => StatusCode::CONFLICT,
            FileErrorCode::InvalidContent => StatusCode::BAD_REQUEST,
            FileErrorCode::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            FileErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Create an error response
pub(crate) fn file_error(code: FileErrorCode, message: impl Into<String>) -> Response {
    let status = code.status_code();
    let body = Json(ErrorBody {
        status: status.as_u16(),
        code: code.as_str().to_string(),
        error: message.into(),
    });
    (status, body).into_response()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Missing or invalid 'projectName'")]
    InvalidProject,
    #[error("Missing or empty 'path'")]
    EmptyPath,
    #[error("Path contains null bytes")]
    NullByte,
    #[error("Absolute paths are not allowed")]
    Absolute,
    #[error("Path escapes project directory")]
    EscapesProject,
}

impl PathError {
    fn code(&self) -> FileErrorCode {
        match self {
            PathError::InvalidProject | PathError::EmptyPath => FileErrorCode::InvalidRequest,
            PathError::NullByte | PathError::Absolute | PathError::EscapesProject => {
                FileErrorCode::PathTraversal
            }
        }
    }
}

impl IntoResponse for PathError {
    fn into_response(self) -> Response {
        file_error(self.code(), self.to_string())
    }
}

/// Normalizes a project-relative path, rejecting anything that could
/// address a location outside the project directory.
pub fn normalize_relative(user_path: &str) -> Result<PathBuf, PathError> {
    if user_path.contains('\0') {
        return Err(PathError::NullByte);
    }
    if user_path.starts_with('/') || user_path.starts_with('\\') {
        return Err(PathError::Absolute);
    }

    let mut normalized = PathBuf::new();
    for comp in Path::new(user_path).components() {
        match comp {
            Component::Normal(s) => normalized.push(s),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(PathError::EscapesProject);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(PathError::Absolute),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(PathError::EmptyPath);
    }
    Ok(normalized)
}

/// A project name must be exactly one plain path component.
pub(crate) fn validate_project(project_name: &str) -> Result<&str, PathError> {
    let mut components = Path::new(project_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !project_name.contains(['\0', '/', '\\']) => {
            Ok(project_name)
        }
        _ => Err(PathError::InvalidProject),
    }
}

/// Resolved location of a file request
struct ProjectPath {
    project_dir: PathBuf,
    full_path: PathBuf,
}

fn resolve(root: &Path, project_name: &str, user_path: &str) -> Result<ProjectPath, PathError> {
    let project = validate_project(project_name)?;
    let relative = normalize_relative(user_path)?;
    let project_dir = root.join(project);
    let full_path = project_dir.join(relative);

    check_confinement(&project_dir, &full_path)?;

    Ok(ProjectPath {
        project_dir,
        full_path,
    })
}

/// Symlinks inside the project must not lead outside it. The target may not
/// exist yet, so the deepest existing ancestor is checked instead; writes
/// only ever create entries below that ancestor.
fn check_confinement(project_dir: &Path, full_path: &Path) -> Result<(), PathError> {
    // A missing project is bounded by the root it would be created in.
    let Some(boundary) = project_dir.ancestors().find(|p| p.exists()) else {
        return Ok(());
    };
    // symlink_metadata so a dangling link counts as existing and fails below.
    let Some(existing) = full_path
        .ancestors()
        .find(|p| p.symlink_metadata().is_ok())
    else {
        return Ok(());
    };

    let boundary = boundary
        .canonicalize()
        .map_err(|_| PathError::EscapesProject)?;
    let real = existing
        .canonicalize()
        .map_err(|_| PathError::EscapesProject)?;
    if real.starts_with(&boundary) {
        Ok(())
    } else {
        tracing::warn!(path = %full_path.display(), real = %real.display(), "path escapes project");
        Err(PathError::EscapesProject)
    }
}

pub(crate) fn bad_json(rejection: JsonRejection) -> Response {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_error(
            FileErrorCode::TooLarge,
            format!("Request body exceeds {UPDATE_BODY_LIMIT} bytes"),
        );
    }
    file_error(
        FileErrorCode::InvalidRequest,
        format!("Invalid JSON body: {}", rejection.body_text()),
    )
}

/// Query parameters for `GET /files`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileParams {
    pub project_name: Option<String>,
    pub path: Option<String>,
}

/// Read a whole file
pub async fn get_file(State(state): State<ApiState>, Query(params): Query<FileParams>) -> Response {
    let Some(project_name) = params.project_name.filter(|p| !p.is_empty()) else {
        return file_error(
            FileErrorCode::InvalidRequest,
            "Missing 'projectName' query parameter",
        );
    };
    let Some(user_path) = params.path.filter(|p| !p.is_empty()) else {
        return file_error(FileErrorCode::InvalidRequest, "Missing 'path' query parameter");
    };

    let resolved = match resolve(state.app_state.root(), &project_name, &user_path) {
        Ok(r) => r,
        Err(err) => return err.into_response(),
    };

    match fs::metadata(&resolved.full_path).await {
        Ok(m) if m.is_dir() => {
            return file_error(
                FileErrorCode::NotAFile,
                format!("Path is a directory, not a file: {user_path}"),
            );
        }
        Ok(m) if m.len() > MAX_FILE_SIZE => {
            return file_error(
                FileErrorCode::TooLarge,
                format!("File exceeds {MAX_FILE_SIZE} bytes: {user_path}"),
            );
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return file_error(FileErrorCode::NotFound, "File not found");
        }
        Err(e) => {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to read file metadata: {e}"),
            );
        }
    }

    let bytes = match fs::read(&resolved.full_path).await {
        Ok(b) => b,
        Err(e) => {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to read file: {e}"),
            );
        }
    };

    // Binary content (null bytes or invalid UTF-8) is not editable text.
    if bytes.contains(&0) {
        return file_error(
            FileErrorCode::InvalidContent,
            "Binary files are not supported",
        );
    }
    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => {
            return file_error(FileErrorCode::InvalidContent, "File contains invalid UTF-8");
        }
    };

    tracing::debug!(project = %project_name, path = %user_path, bytes = content.len(), "file read");
    (StatusCode::OK, Json(FileContent { content })).into_response()
}

/// Overwrite a file with new content
pub async fn update_file(
    State(state): State<ApiState>,
    payload: Result<Json<UpdateFileRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };

    let resolved = match resolve(state.app_state.root(), &req.project_name, &req.path) {
        Ok(r) => r,
        Err(err) => return err.into_response(),
    };

    if req.content.len() as u64 > MAX_FILE_SIZE {
        return file_error(
            FileErrorCode::TooLarge,
            format!("Content exceeds {MAX_FILE_SIZE} bytes"),
        );
    }

    if !resolved.project_dir.is_dir() {
        return file_error(
            FileErrorCode::NotFound,
            format!("Project not found: {}", req.project_name),
        );
    }

    if let Ok(m) = fs::metadata(&resolved.full_path).await {
        if m.is_dir() {
            return file_error(
                FileErrorCode::NotAFile,
                format!("Path is a directory: {}", req.path),
            );
        }
    }

    if let Some(parent) = resolved.full_path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            return file_error(
                FileErrorCode::InternalError,
                format!("Failed to create parent directory: {e}"),
            );
        }
    }

    match fs::write(&resolved.full_path, req.content.as_bytes()).await {
        Ok(()) => {
            tracing::info!(
                project = %req.project_name,
                path = %req.path,
                bytes = req.content.len(),
                "file updated"
            );
            (StatusCode::OK, Json(Ack::new("File updated successfully"))).into_response()
        }
        Err(e) => file_error(
            FileErrorCode::InternalError,
            format!("Failed to update file: {e}"),
        ),
    }
}

/// Create a new, empty file
pub async fn create_file(
    State(state): State<ApiState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };

    let resolved = match resolve(state.app_state.root(), &req.project_name, &req.path) {
        Ok(r) => r,
        Err(err) => return err.into_response(),
    };

    if resolved.full_path.exists() {
        return file_error(
            FileErrorCode::AlreadyExists,
            format!("File already exists: {}", req.path),
        );
    }

    if let Some(parent) = resolved.full_path.parent() {
        if !parent.is_dir() {
            return file_error(
                FileErrorCode::NotADirectory,
                format!("Parent directory does not exist: {}", req.path),
            );
        }
    }

    match fs::write(&resolved.full_path, b"").await {
        Ok(()) => {
            tracing::info!(project = %req.project_name, path = %req.path, "file created");
            (StatusCode::OK, Json(Ack::new("File created successfully"))).into_response()
        }
        Err(e) => file_error(
            FileErrorCode::InternalError,
            format!("Failed to create file: {e}"),
        ),
    }
}

/// Create a directory (and any missing parents)
pub async fn create_folder(
    State(state): State<ApiState>,
    payload: Result<Json<CreateEntryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(json) => json,
        Err(rejection) => return bad_json(rejection),
    };

    let resolved = match resolve(state.app_state.root(), &req.project_name, &req.path) {
        Ok(r) => r,
        Err(err) => return err.into_response(),
    };

    if resolved.full_path.exists() {
        return file_error(
            FileErrorCode::AlreadyExists,
            format!("Directory already exists: {}", req.path),
        );
    }

    match fs::create_dir_all(&resolved.full_path).await {
        Ok(()) => {
            tracing::info!(project = %req.project_name, path = %req.path, "folder created");
            (StatusCode::OK, Json(Ack::new("Folder created successfully"))).into_response()
        }
        Err(e) => file_error(
            FileErrorCode::InternalError,
            format!("Failed to create folder: {e}"),
        ),
    }
}
