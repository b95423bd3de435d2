//! Files API Integration Tests
//!
//! Tests full HTTP request/response cycles for the project file endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use file_server::api;
use file_server::api::files;
use file_server::app_state::AppState;

fn setup_test_app() -> (axum::Router, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    std::fs::create_dir_all(temp_dir.path().join("proj1")).expect("Failed to create project");

    let api_state = api::ApiState {
        app_state: AppState::new(temp_dir.path()),
    };
    let app = api::router().with_state(api_state);
    (app, temp_dir)
}

async fn json_response(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("Request failed");
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value: Value = serde_json::from_slice(&body).expect("Invalid JSON response");
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (app, _temp_dir) = setup_test_app();
    let (status, body) = json_response(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

// ============================================================================
// Get File Tests
// ============================================================================

#[tokio::test]
async fn test_get_file_returns_content() {
    let (app, temp_dir) = setup_test_app();
    std::fs::write(temp_dir.path().join("proj1/main.c"), "int main() {}").unwrap();

    let (status, body) = json_response(&app, get("/files?projectName=proj1&path=main.c")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "int main() {}");
}

#[tokio::test]
async fn test_get_file_not_found() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(&app, get("/files?projectName=proj1&path=missing.c")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_get_file_missing_project_param() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(&app, get("/files?path=main.c")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'projectName' query parameter");
}

#[tokio::test]
async fn test_get_file_missing_path_param() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(&app, get("/files?projectName=proj1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing 'path' query parameter");
}

#[tokio::test]
async fn test_get_file_directory_rejected() {
    let (app, temp_dir) = setup_test_app();
    std::fs::create_dir_all(temp_dir.path().join("proj1/src")).unwrap();

    let (status, body) = json_response(&app, get("/files?projectName=proj1&path=src")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_A_FILE");
}

#[tokio::test]
async fn test_get_file_binary_rejected() {
    let (app, temp_dir) = setup_test_app();
    std::fs::write(temp_dir.path().join("proj1/blob.bin"), [0u8, 1, 2]).unwrap();

    let (status, body) = json_response(&app, get("/files?projectName=proj1&path=blob.bin")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CONTENT");
}

#[tokio::test]
async fn test_get_file_path_traversal() {
    let (app, temp_dir) = setup_test_app();
    std::fs::write(temp_dir.path().join("secret.txt"), "top secret").unwrap();

    let (status, body) =
        json_response(&app, get("/files?projectName=proj1&path=../secret.txt")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PATH_TRAVERSAL");
}

#[tokio::test]
async fn test_get_file_project_traversal() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(&app, get("/files?projectName=..&path=proj1/x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

// ============================================================================
// Update File Tests
// ============================================================================

#[tokio::test]
async fn test_update_file_overwrites_whole_file() {
    let (app, temp_dir) = setup_test_app();
    let file = temp_dir.path().join("proj1/main.c");
    std::fs::write(&file, "old content that is longer").unwrap();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "main.c", "content": "ab"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File updated successfully");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "ab");

    let (status, body) = json_response(&app, get("/files?projectName=proj1&path=main.c")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "ab");
}

#[tokio::test]
async fn test_update_file_creates_nested_file() {
    let (app, temp_dir) = setup_test_app();

    let (status, _body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "src/lib/util.c", "content": "void f(){}"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("proj1/src/lib/util.c")).unwrap(),
        "void f(){}"
    );
}

#[tokio::test]
async fn test_update_file_unknown_project() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "nope", "path": "main.c", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found: nope");
}

#[tokio::test]
async fn test_update_file_missing_content_field() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post("/files/update", json!({"projectName": "proj1", "path": "main.c"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_update_file_path_traversal() {
    let (app, temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "../../escape.txt", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PATH_TRAVERSAL");
    assert!(!temp_dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_update_file_directory_rejected() {
    let (app, temp_dir) = setup_test_app();
    std::fs::create_dir_all(temp_dir.path().join("proj1/src")).unwrap();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "src", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_A_FILE");
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_file_through_symlinked_folder_rejected() {
    let (app, temp_dir) = setup_test_app();
    let outside = tempfile::tempdir().expect("Failed to create outside directory");
    std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("proj1/link")).unwrap();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "link/new.c", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PATH_TRAVERSAL");
    assert!(!outside.path().join("new.c").exists());

    // Nested directories below the link must not be created either.
    let (status, _body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "link/a/b/new.c", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!outside.path().join("a").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_file_through_dangling_symlink_rejected() {
    let (app, temp_dir) = setup_test_app();
    let outside = tempfile::tempdir().expect("Failed to create outside directory");
    let target = outside.path().join("created.c");
    std::os::unix::fs::symlink(&target, temp_dir.path().join("proj1/dangling.c")).unwrap();

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "dangling.c", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PATH_TRAVERSAL");
    assert!(!target.exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_get_file_through_symlink_rejected() {
    let (app, temp_dir) = setup_test_app();
    let outside = tempfile::tempdir().expect("Failed to create outside directory");
    std::fs::write(outside.path().join("secret.txt"), "top secret").unwrap();
    std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("proj1/link")).unwrap();

    let (status, body) =
        json_response(&app, get("/files?projectName=proj1&path=link/secret.txt")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PATH_TRAVERSAL");
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_file_through_in_project_symlink_allowed() {
    let (app, temp_dir) = setup_test_app();
    std::fs::create_dir_all(temp_dir.path().join("proj1/real")).unwrap();
    std::os::unix::fs::symlink(
        temp_dir.path().join("proj1/real"),
        temp_dir.path().join("proj1/alias"),
    )
    .unwrap();

    let (status, _body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "alias/x.c", "content": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("proj1/real/x.c")).unwrap(),
        "x"
    );
}

#[tokio::test]
async fn test_update_file_escaped_content_near_cap_accepted() {
    let (app, temp_dir) = setup_test_app();
    // Each newline doubles when JSON-escaped.
    let content = "\n".repeat(2_000_000);

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "big.txt", "content": content}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        std::fs::metadata(temp_dir.path().join("proj1/big.txt"))
            .unwrap()
            .len(),
        2_000_000
    );
}

#[tokio::test]
async fn test_update_file_over_cap_is_too_large() {
    let (app, _temp_dir) = setup_test_app();
    let content = "a".repeat(2 * 1_048_576 + 1);

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "big.txt", "content": content}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "TOO_LARGE");
}

#[tokio::test]
async fn test_update_file_body_over_limit_is_too_large() {
    let (app, _temp_dir) = setup_test_app();
    let content = "a".repeat(files::UPDATE_BODY_LIMIT + 1);

    let (status, body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "proj1", "path": "big.txt", "content": content}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "TOO_LARGE");
}

// ============================================================================
// Create File / Folder Tests
// ============================================================================

#[tokio::test]
async fn test_create_file_then_conflict() {
    let (app, temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post("/files", json!({"projectName": "proj1", "path": "new.c"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File created successfully");
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("proj1/new.c")).unwrap(),
        ""
    );

    let (status, body) = json_response(
        &app,
        post("/files", json!({"projectName": "proj1", "path": "new.c"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_create_file_missing_parent() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post("/files", json!({"projectName": "proj1", "path": "no/such/dir.c"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NOT_A_DIRECTORY");
}

#[tokio::test]
async fn test_create_folder_recursive() {
    let (app, temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post("/folders", json!({"projectName": "proj1", "path": "src/nested"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Folder created successfully");
    assert!(temp_dir.path().join("proj1/src/nested").is_dir());

    let (status, body) = json_response(
        &app,
        post("/folders", json!({"projectName": "proj1", "path": "src/nested"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");
}

// ============================================================================
// Projects Tests
// ============================================================================

#[tokio::test]
async fn test_create_project_writes_metadata_and_folders() {
    let (app, temp_dir) = setup_test_app();

    let (status, body) = json_response(
        &app,
        post("/projects", json!({"name": "demo", "description": "A demo"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "demo");
    assert_eq!(body["description"], "A demo");
    assert_eq!(body["created_at"].as_str().unwrap().len(), "YYYY-MM-DD".len());

    let project = temp_dir.path().join("demo");
    for subdir in ["objects", "scenes", "scripts", "reports"] {
        assert!(project.join(subdir).is_dir(), "missing {subdir}");
    }
    let metadata: Value =
        serde_json::from_str(&std::fs::read_to_string(project.join("nora.json")).unwrap())
            .unwrap();
    assert_eq!(metadata, body);
}

#[tokio::test]
async fn test_create_project_then_edit_file() {
    let (app, temp_dir) = setup_test_app();

    let (status, _body) =
        json_response(&app, post("/projects", json!({"name": "fresh"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _body) = json_response(
        &app,
        post(
            "/files/update",
            json!({"projectName": "fresh", "path": "scripts/main.c", "content": "int x;"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("fresh/scripts/main.c")).unwrap(),
        "int x;"
    );
}

#[tokio::test]
async fn test_create_project_conflict_and_invalid_name() {
    let (app, _temp_dir) = setup_test_app();

    let (status, body) = json_response(&app, post("/projects", json!({"name": "proj1"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_EXISTS");

    for name in ["", "..", "a/b"] {
        let (status, body) = json_response(&app, post("/projects", json!({"name": name}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "name {name:?}");
        assert_eq!(body["error"], "Missing or invalid 'name' field");
    }

    let (status, body) = json_response(&app, post("/projects", json!({"description": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_list_projects_reads_metadata() {
    let (app, temp_dir) = setup_test_app();
    for name in ["zeta", "alpha"] {
        let (status, _body) = json_response(&app, post("/projects", json!({"name": name}))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    // Directories without readable metadata are skipped.
    std::fs::create_dir_all(temp_dir.path().join("broken")).unwrap();
    std::fs::write(temp_dir.path().join("broken/nora.json"), "{not json").unwrap();
    std::fs::write(temp_dir.path().join("stray.txt"), "x").unwrap();

    let (status, body) = json_response(&app, get("/projects")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(body[0]["description"], "");
}
