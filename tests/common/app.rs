//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::time::Duration;
use tower::ServiceExt;

use tategaki::models::AppConfig;
use tategaki::server::{build_router, create_app_state_with_backend, AppState};
use tategaki::services::FontCatalog;

use super::fixtures::TOKEN;
use super::mock_backend::MockBackend;

/// Test application with router and direct access to the mock backend
pub struct TestApp {
    router: axum::Router,
    pub state: AppState,
    pub backend: MockBackend,
}

impl TestApp {
    /// Create a test application around a fresh mock backend
    pub async fn new() -> Self {
        Self::with_backend(test_config(), MockBackend::new()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        Self::with_backend(config, MockBackend::new()).await
    }

    pub async fn with_backend(config: AppConfig, backend: MockBackend) -> Self {
        let state = create_app_state_with_backend(config, backend.clone(), FontCatalog::empty("antique"))
            .await
            .expect("Failed to create app state");

        // Build router using shared server module (same as production)
        let router = build_router(state.clone());

        Self { router, state, backend }
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.get_with_headers(path, &[]).await
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let mut builder = Request::get(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Make an authenticated GET request
    pub async fn get_authed(&self, path: &str) -> TestResponse {
        let bearer = format!("Bearer {TOKEN}");
        self.get_with_headers(path, &[("Authorization", &bearer)]).await
    }

    /// Make a POST request with JSON body
    pub async fn post_json(&self, path: &str, headers: &[(&str, &str)], body: &str) -> TestResponse {
        let mut builder = Request::post(path).header("Content-Type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Make an authenticated POST request with JSON body
    pub async fn post_authed(&self, path: &str, body: &serde_json::Value) -> TestResponse {
        let bearer = format!("Bearer {TOKEN}");
        self.post_json(path, &[("Authorization", &bearer)], &body.to_string())
            .await
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Config used by most tests: known token, no warm-up, small pool
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.api_token = Some(TOKEN.to_string());
    config.render.max_concurrency = 2;
    config.render.precreate = false;
    config.render.warmup = false;
    config.render.render_timeout_secs = 5;
    config
}

/// Give background tasks a moment to run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
