//! HTTP API routes for the Nora file server
//!
//! Stateless REST access to projects and their files. Editing sessions load
//! with `GET /files` and save with `POST /files/update`.

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

pub mod files;
pub mod projects;

use crate::app_state::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: AppState,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        // Projects API routes
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        // Files API routes
        .route("/files", get(files::get_file).post(files::create_file))
        .route(
            "/files/update",
            post(files::update_file).layer(DefaultBodyLimit::max(files::UPDATE_BODY_LIMIT)),
        )
        .route("/folders", post(files::create_folder))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
