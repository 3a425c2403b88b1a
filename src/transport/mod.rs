//! Authenticated HTTP transport for the builder backend.
//!
//! Thin wrapper over `reqwest`: JSON GET/POST plus a multipart POST for
//! archive uploads. Transport and status failures are mapped to a fixed
//! message table and returned to the caller — never swallowed, never
//! retried. Every call is at-most-once.

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default per-call timeout when the caller does not override it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// No response object at all — network, DNS, or timeout.
    #[error("cannot connect to server: {0}")]
    Connect(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("server issue: {0}")]
    ServerIssue(String),

    /// Any other non-2xx status; carries the server-provided message field.
    #[error("{0}")]
    Backend(String),

    #[error("malformed response body: {0}")]
    Body(String),
}

/// Map an HTTP status plus the response body to the fixed message table.
///
/// The body's `message` field, when present, is carried into the error text
/// so command handlers can surface the server's own wording.
pub fn classify_status(status: StatusCode, body: &str) -> TransportError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        404 => TransportError::NotFound(message),
        403 => TransportError::NotAuthorized(message),
        500 => TransportError::ServerIssue(message),
        _ => TransportError::Backend(message),
    }
}

// ─── RequestConfig ────────────────────────────────────────────────────────────

/// Per-call configuration: base URL, timeout, optional bearer token.
///
/// Backend calls derive this from the current workspace connection;
/// register/connect build it from an explicit endpoint instead.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub bearer: Option<String>,
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            bearer: None,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// Shared HTTP client with persistent connections.
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
}

impl Transport {
    pub fn new(default_timeout_ms: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(default_timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    pub async fn get(&self, path: &str, config: &RequestConfig) -> Result<Value, TransportError> {
        let url = config.url(path);
        debug!(%url, "GET");
        let mut req = self.client.get(&url).timeout(config.timeout);
        if let Some(token) = &config.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        read_json(resp).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        config: &RequestConfig,
    ) -> Result<Value, TransportError> {
        let url = config.url(path);
        debug!(%url, "POST");
        let mut req = self.client.post(&url).timeout(config.timeout).json(body);
        if let Some(token) = &config.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        read_json(resp).await
    }

    /// POST a multipart form: scalar fields plus a binary part named
    /// `archive`. Archive transfer and server-side processing are slower
    /// than plain JSON calls, so the caller supplies the timeout.
    pub async fn post_archive(
        &self,
        path: &str,
        fields: &[(&str, String)],
        archive: Vec<u8>,
        timeout: Duration,
        config: &RequestConfig,
    ) -> Result<Value, TransportError> {
        let url = config.url(path);
        debug!(%url, bytes = archive.len(), "POST multipart");

        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }
        let part = Part::bytes(archive)
            .file_name("archive.tar.gz")
            .mime_str("application/octet-stream")
            .map_err(|e| TransportError::Body(e.to_string()))?;
        form = form.part("archive", part);

        let mut req = self.client.post(&url).timeout(timeout).multipart(form);
        if let Some(token) = &config.bearer {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        read_json(resp).await
    }
}

async fn read_json(resp: reqwest::Response) -> Result<Value, TransportError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| TransportError::Body(e.to_string()))?;

    if !status.is_success() {
        return Err(classify_status(status, &body));
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| TransportError::Body(e.to_string()))
}

// ─── Tests ────────────────────────────────────────────────────────────────────
