//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the full router over a
//! temporary output root and an in-memory overlay store, so requests run
//! without binding a socket.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use hlsrelay_core::{
    Config, DatabaseConfig, ServerConfig, SqliteOverlayStore, StreamManager, StreamsConfig,
};
use hlsrelay_server::state::AppState;

/// Public base URL used by every fixture.
pub const BASE_URL: &str = "http://localhost:5000/hls/";

/// Test fixture wrapping the router and its temporary directories.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list_streams() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.get("/api/streams").await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Shared state behind the router
    pub state: Arc<AppState>,
    /// Temporary directory holding the HLS output root
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// A fixture whose transcoder binary does not exist.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let streams = StreamsConfig::new(temp_dir.path().join("streams"), BASE_URL)
            .with_transcoder("hlsrelay-no-such-transcoder");
        Self::build(temp_dir, streams)
    }

    /// A fixture driving a fake transcoder script.
    #[cfg(unix)]
    pub fn with_fake_transcoder(
        behavior: hlsrelay_core::testing::FakeBehavior,
        readiness_timeout: Duration,
    ) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let fake = hlsrelay_core::testing::FakeTranscoder::install(temp_dir.path(), behavior)
            .expect("Failed to install fake transcoder");
        let streams = fake
            .config(temp_dir.path().join("streams"), BASE_URL)
            .with_readiness(Duration::from_millis(25), readiness_timeout)
            .with_grace_period(Duration::from_millis(500));
        Self::build(temp_dir, streams)
    }

    fn build(temp_dir: TempDir, streams: StreamsConfig) -> Self {
        std::fs::create_dir_all(&streams.output_root).expect("Failed to create output root");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            streams: streams.clone(),
            database: DatabaseConfig {
                path: temp_dir.path().join("test.db"),
            },
        };

        let overlays =
            Arc::new(SqliteOverlayStore::in_memory().expect("Failed to create overlay store"));
        let state = Arc::new(AppState::new(
            config,
            Arc::new(StreamManager::new(streams)),
            overlays,
        ));
        let router = hlsrelay_server::api::create_router(Arc::clone(&state));

        Self {
            router,
            state,
            temp_dir,
        }
    }

    /// HLS output root served under `/hls`.
    pub fn output_root(&self) -> PathBuf {
        self.state.config().streams.output_root.clone()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body (for static files and metrics).
    pub async fn get_raw(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
