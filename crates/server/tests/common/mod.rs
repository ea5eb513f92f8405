//! Common test utilities for driving the web front end with mocks.
//!
//! The router runs in-process; the pipeline is replaced by
//! [`MockRunner`] and email delivery by [`MockMailer`].

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use mashup_core::testing::MockRunner;
use mashup_core::Config;
use mashup_server::{AppState, MailError, Mailer};

/// One recorded delivery.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub attachment: Vec<u8>,
    pub filename: String,
}

/// Mock implementation of the Mailer trait.
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Arc<RwLock<Vec<SentMail>>>,
    next_error: Arc<RwLock<Option<MailError>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the next send to fail with the given error.
    pub async fn set_next_error(&self, error: MailError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(
        &self,
        recipient: &str,
        attachment: Vec<u8>,
        filename: &str,
    ) -> Result<(), MailError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        self.sent.write().await.push(SentMail {
            recipient: recipient.to_string(),
            attachment,
            filename: filename.to_string(),
        });
        Ok(())
    }
}

/// Test fixture with an in-process router and controllable mocks.
pub struct TestFixture {
    pub router: Router,
    pub runner: Arc<MockRunner>,
    pub mailer: Arc<MockMailer>,
    /// Scratch root for per-request directories.
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    pub async fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);

        let runner = Arc::new(MockRunner::new());
        let mailer = Arc::new(MockMailer::new());

        let state = AppState::new(
            config,
            Arc::clone(&runner) as Arc<dyn mashup_core::MashupRunner>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
        )
        .with_scratch_root(temp_dir.path().join("scratch"));

        let router = mashup_server::create_router(Arc::new(state));

        Self {
            router,
            runner,
            mailer,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", form_encode(k), form_encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Entries left in the scratch root after requests complete.
    pub fn scratch_leftovers(&self) -> Vec<String> {
        match std::fs::read_dir(self.temp_dir.path().join("scratch")) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
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

        TestResponse {
            status,
            text: String::from_utf8_lossy(&body_bytes).to_string(),
        }
    }
}

fn form_encode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
