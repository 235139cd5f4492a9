//! Test helpers: build AppState and router for integration tests.
//!
//! The rate limit store lives in memory and the media tools are `sh -c` scripts, so
//! these tests need neither Docker nor yt-dlp/ffmpeg.

#![allow(dead_code)]

use axum_test::{TestRequest, TestServer};
use melody_api::setup::routes;
use melody_api::state::AppState;
use melody_core::models::RateLimitRecord;
use melody_core::{AppError, ClientIdentifier, Config, OriginMode};
use melody_db::{InMemoryRateLimitStore, RateLimitStore};
use melody_infra::{HumanVerifier, OriginPolicy, RateLimiter};
use melody_processing::{DownloadOrchestrator, DownloadPipelineConfig, ToolCommand};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const CLIENT_IP: &str = "203.0.113.7";
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
pub const DOWNLOAD_LIMIT: i32 = 5;

/// Accepts or rejects every token and counts how often it was asked.
pub struct StaticVerifier {
    accept: bool,
    calls: AtomicUsize,
}

impl StaticVerifier {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HumanVerifier for StaticVerifier {
    async fn verify(&self, _token: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept
    }
}

/// Store whose backend is unreachable.
pub struct FailingStore;

#[async_trait::async_trait]
impl RateLimitStore for FailingStore {
    async fn get(&self, _: &ClientIdentifier) -> Result<Option<RateLimitRecord>, AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }

    async fn increment(&self, _: &ClientIdentifier) -> Result<RateLimitRecord, AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(AppError::Internal("connection refused".to_string()))
    }
}

/// Development origins, in-memory store, one trusted proxy.
pub fn test_config() -> Config {
    let vars: HashMap<String, String> = [
        ("MODE", "dev"),
        ("RATE_LIMIT_STORE", "memory"),
        ("RECAPTCHA_SECRET_KEY", "test-secret"),
        ("TRUSTED_PROXY_COUNT", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Config::from_map(&vars).expect("Failed to build test config")
}

/// Prints metadata with `--dump-json`, otherwise runs `stream_script`.
pub fn fake_extractor(stream_script: &str) -> ToolCommand {
    let script = format!(
        r#"case " $* " in
  *" --dump-json "*) echo '{{"title": "Never: Gonna/Give?", "uploader": "Rick"}}' ;;
  *) {} ;;
esac"#,
        stream_script
    );
    ToolCommand::with_args("sh", ["-c".to_string(), script, "extractor".to_string()])
}

pub fn fake_transcoder(script: &str) -> ToolCommand {
    ToolCommand::with_args("sh", ["-c", script, "transcoder"])
}

/// Extractor writes `AUDIO`, transcoder copies it through.
pub fn working_pipeline() -> DownloadPipelineConfig {
    DownloadPipelineConfig {
        extractor: fake_extractor("printf 'AUDIO'"),
        transcoder: fake_transcoder("cat"),
        metadata_timeout: Duration::from_secs(10),
        ..DownloadPipelineConfig::default()
    }
}

pub fn client_identifier() -> ClientIdentifier {
    ClientIdentifier::from_address(CLIENT_IP)
}

/// Test application: server plus the collaborators tests inspect.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryRateLimitStore>,
    pub verifier: Arc<StaticVerifier>,
}

impl TestApp {
    /// A download request that passes every gate when the verifier accepts.
    pub fn download(&self, body: serde_json::Value) -> TestRequest {
        self.server
            .post("/api/download")
            .add_header("Origin", ALLOWED_ORIGIN)
            .add_header("X-Forwarded-For", CLIENT_IP)
            .json(&body)
    }

    pub async fn download_count(&self, identifier: &ClientIdentifier) -> i32 {
        self.store
            .get(identifier)
            .await
            .expect("in-memory store never fails")
            .map_or(0, |record| record.download_count)
    }
}

pub fn download_body() -> serde_json::Value {
    json!({ "url": VIDEO_URL, "recaptchaToken": "client-token" })
}

pub fn build_server(
    store: Arc<dyn RateLimitStore>,
    verifier: Arc<dyn HumanVerifier>,
    pipeline: DownloadPipelineConfig,
) -> TestServer {
    let state = Arc::new(AppState {
        config: test_config(),
        rate_limiter: RateLimiter::new(store, DOWNLOAD_LIMIT),
        verifier,
        origin_policy: OriginPolicy::new(OriginMode::Development, "051205.xyz")
            .expect("Failed to build origin policy"),
        orchestrator: DownloadOrchestrator::new(pipeline),
    });
    let app = routes::setup_routes(state);
    TestServer::new(app.into_make_service()).expect("Failed to create test server")
}

/// Setup test app with the given verifier decision and pipeline.
pub fn setup_test_app_with(accept: bool, pipeline: DownloadPipelineConfig) -> TestApp {
    let store = Arc::new(InMemoryRateLimitStore::new());
    let verifier = Arc::new(StaticVerifier::new(accept));
    let server = build_server(store.clone(), verifier.clone(), pipeline);
    TestApp {
        server,
        store,
        verifier,
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(true, working_pipeline())
}
