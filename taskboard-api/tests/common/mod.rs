/// Common test utilities for router integration tests
///
/// Every context gets its own in-memory store, so tests never share rows
/// and need no database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::repository::InMemoryStore;
use tower::ServiceExt;

/// Test context with a router over a fresh store
pub struct TestContext {
    pub app: Router,
    pub store: InMemoryStore,
    pub state: AppState,
}

/// Status, headers and parsed body of one response
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

impl TestContext {
    pub fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "TASKBOARD_STORAGE" => Some("memory".to_string()),
            _ => None,
        })
        .expect("memory config");

        let store = InMemoryStore::new();
        let state = AppState::in_memory(store.clone(), config);
        let app = build_router(state.clone());

        Self { app, store, state }
    }

    /// Sends a request; `body` is sent as JSON when present
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    /// Sends a raw body with a JSON content type
    pub async fn send_raw(&self, method: Method, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send_request(request).await
    }

    async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            location,
            body,
        }
    }

    /// Creates a user and returns its ID
    pub async fn create_user(&self, email: &str) -> i64 {
        let response = self
            .send(Method::POST, "/api/users", Some(user_body("Ann Lee", email)))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Creates a task item for `user_id` and returns its ID
    pub async fn create_task(&self, user_id: i64) -> i64 {
        let response = self
            .send(Method::POST, "/api/taskitems", Some(task_body(user_id)))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}

pub fn user_body(full_name: &str, email: &str) -> Value {
    json!({
        "fullName": full_name,
        "telephone": "+1-555-0100",
        "email": email
    })
}

pub fn task_body(user_id: i64) -> Value {
    json!({
        "title": "Ship report",
        "description": "Q3 report",
        "dueDate": "2025-01-01T00:00:00Z",
        "priority": "Medium",
        "userId": user_id
    })
}
