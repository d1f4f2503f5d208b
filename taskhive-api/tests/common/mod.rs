/// Common test utilities for integration tests
///
/// Provides a test context that connects to the database named by
/// `DATABASE_URL`, runs migrations and builds the full router. Tests drive
/// the API in-process through tower's `oneshot`; no listening socket.
///
/// These tests require a running Postgres and are `#[ignore]`d by default:
///
/// ```bash
/// DATABASE_URL=postgres://localhost/taskhive_test \
///     cargo test -- --ignored --test-threads=1
/// ```
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use taskhive_api::app::{build_router, AppState};
use taskhive_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskhive_shared::db::migrations::run_migrations;
use tower::util::ServiceExt;

const TEST_JWT_SECRET: &str = "taskhive-test-secret-key-0123456789abcdef";

/// Test context containing the app router and a direct pool handle
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
}

impl TestContext {
    /// Connects, migrates and builds the router
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must point at a test database for integration tests");

        let db = PgPool::connect(&database_url).await?;
        run_migrations(&db).await?;

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
        };

        let app = build_router(AppState::new(db.clone(), config));

        Ok(Self { db, app })
    }

    /// Removes everything the tests created
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("TRUNCATE TABLE invitations, projects, users")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Sends one request through the router and returns status plus parsed body
pub async fn call(
    ctx: &TestContext,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = ctx.app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Registers a user through the API, returning (token, user json)
pub async fn register_user(
    ctx: &TestContext,
    first_name: &str,
    last_name: &str,
    email: &str,
) -> (String, Value) {
    let (status, body) = call(
        ctx,
        "POST",
        "/users/register",
        None,
        Some(serde_json::json!({
            "first_name": first_name,
            "last_name": last_name,
            "email": email,
            "password": "MyP@ssw0rd!",
            "vpassword": "MyP@ssw0rd!",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"].clone(),
    )
}

/// Creates a project through the API, returning the project json
pub async fn create_project(ctx: &TestContext, token: &str, title: &str) -> Value {
    let (status, body) = call(
        ctx,
        "POST",
        "/projects/add",
        Some(token),
        Some(serde_json::json!({ "title": title })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);

    let projects = body["projects"].as_array().unwrap();
    let entry = projects
        .iter()
        .find(|p| p["project"]["title"] == title)
        .expect("created project missing from list");
    entry["project"].clone()
}

/// Adds a task through the API, returning its id
pub async fn add_task(ctx: &TestContext, token: &str, project_id: &str, title: &str, assignee_username: &str) -> String {
    let (status, body) = call(
        ctx,
        "PATCH",
        &format!("/projects/tasks/addtask/{}", project_id),
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "type": "Feature",
            "assignees": [{ "username": assignee_username }],
            "status": "In Development",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "add task failed: {}", body);
    body["new_task_id"].as_str().unwrap().to_string()
}
