use axum::body::Body;
use axum::http::{Request, StatusCode};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use taskboard_server::auth::AuthState;
use taskboard_server::config::Config;
use taskboard_server::task::TaskState;
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt; // for `oneshot`

mod common;

pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub db: DatabaseConnection,
}

async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let container = common::setup_container().await?;
    let db = common::setup_db(&container).await?;
    Ok(TestContext { db, container })
}

fn test_app(db: DatabaseConnection) -> axum::Router {
    let config = Config {
        db_url: "".to_string(),
        port: 8080,
        jwt_secret: "test_secret".to_string(),
        token_ttl_hours: 1,
    };
    let db = Arc::new(db);
    let auth_state = Arc::new(AuthState::from_config(&config, db.clone()));
    let task_state = Arc::new(TaskState { db });
    taskboard_server::web::api::create_api_router(auth_state, task_state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn can_register_new_user() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/register",
            serde_json::json!({"username": "alice", "password": "pw1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["username"], "alice");
    assert!(body["id"].is_number());
    // The stored hash must never appear in a response payload.
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn can_reject_duplicate_registration_with_conflict() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let payload = serde_json::json!({"username": "alice", "password": "pw1"});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/register", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", "/api/v1/register", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["error"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn can_reject_empty_credentials_on_registration() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/register",
            serde_json::json!({"username": "  ", "password": "pw1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn can_login_with_valid_credentials() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/register",
            serde_json::json!({"username": "alice", "password": "pw1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            serde_json::json!({"username": "alice", "password": "pw1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert!(body["token"].is_string());
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_failures_share_one_response_shape() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/register",
            serde_json::json!({"username": "alice", "password": "pw1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            serde_json::json!({"username": "alice", "password": "wrong"}),
        ))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(json_request(
            "POST",
            "/api/v1/login",
            serde_json::json!({"username": "bob", "password": "pw1"}),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    // Observationally indistinguishable: identical bodies.
    let wrong_password_body = read_json(wrong_password).await;
    let unknown_user_body = read_json(unknown_user).await;
    assert_eq!(wrong_password_body, unknown_user_body);
}

#[tokio::test]
async fn tasks_require_authentication() {
    let state = setup().await.expect("Failed to setup test context");
    let app = test_app(state.db.clone());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}
