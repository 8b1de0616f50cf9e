//! Test application setup utilities
//!
//! Provides utilities for setting up test instances of the application
//! over a throwaway SQLite database.

use axum::{body::Body, http::Request, Router};
use tower::ServiceExt;
use uuid::Uuid;

use tender_api::{
    build_router,
    config::{AppConfig, DatabaseConfig},
    db::{self, SqliteOrganizationRepository, SqliteUserRepository},
    models::{Organization, OrganizationType, User},
    AppState,
};

/// Token sent on protected routes; its value is never inspected
pub const TEST_TOKEN: &str = "test-token";

/// Test application wrapper for integration testing
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    users: SqliteUserRepository,
    organizations: SqliteOrganizationRepository,
}

impl TestApp {
    /// Create a new test application with a fresh SQLite file
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Create a new test application with custom configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let db = db::init_pool(&config.database)
            .await
            .expect("Failed to initialize test database");

        let users = SqliteUserRepository::new(db.clone());
        let organizations = SqliteOrganizationRepository::new(db.clone());
        let state = AppState::new(config, db);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            users,
            organizations,
        }
    }

    /// Insert an employee account
    pub async fn seed_user(&self, username: &str) -> User {
        let user = User::new(username);
        self.users.insert(&user).await.expect("Failed to seed user");
        user
    }

    pub async fn seed_organization(&self, name: &str) -> Organization {
        let org = Organization::new(name, OrganizationType::LLC);
        self.organizations
            .insert(&org)
            .await
            .expect("Failed to seed organization");
        org
    }

    pub async fn make_responsible(&self, org: &Organization, user: &User) {
        self.organizations
            .add_responsible(org.id, user.id)
            .await
            .expect("Failed to seed responsibility");
    }

    /// Make a GET request with the bearer token
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send("GET", uri, None).await
    }

    /// Make a GET request without any Authorization header
    pub async fn get_anonymous(&self, uri: &str) -> TestResponse {
        self.request(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send("POST", uri, Some(body)).await
    }

    /// Make a PUT request without a body
    pub async fn put(&self, uri: &str) -> TestResponse {
        self.send("PUT", uri, None).await
    }

    /// Make a PATCH request with JSON body
    pub async fn patch_json(&self, uri: &str, body: serde_json::Value) -> TestResponse {
        self.send("PATCH", uri, Some(body)).await
    }

    async fn send(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> TestResponse {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {}", TEST_TOKEN));

        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.request(request).await
    }

    /// Make an arbitrary request
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: axum::http::StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: bytes::Bytes,
}

impl TestResponse {
    /// Get the response body as a string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse the response body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse response as JSON")
    }

    /// Assert the response status
    pub fn assert_status(&self, expected: axum::http::StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
        self
    }

    /// Assert the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::OK)
    }

    /// Assert the response status is Created (201)
    pub fn assert_created(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::CREATED)
    }

    /// Assert the response status is Bad Request (400)
    pub fn assert_bad_request(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::BAD_REQUEST)
    }

    /// Assert the response status is Unauthorized (401)
    pub fn assert_unauthorized(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::UNAUTHORIZED)
    }

    /// Assert the response status is Forbidden (403)
    pub fn assert_forbidden(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::FORBIDDEN)
    }

    /// Assert the response status is Not Found (404)
    pub fn assert_not_found(&self) -> &Self {
        self.assert_status(axum::http::StatusCode::NOT_FOUND)
    }
}

/// Create a test configuration with a temporary SQLite database
pub fn test_config() -> AppConfig {
    // Unique file per test to avoid conflicts
    let db_path = std::env::temp_dir().join(format!("tender_api_test_{}.db", Uuid::new_v4().simple()));

    let mut config = AppConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.request_timeout_secs = None;
    config.database = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", db_path.display()),
        max_connections: 1,
        min_connections: 1,
        ..DatabaseConfig::default()
    };
    config
}
