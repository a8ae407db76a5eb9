//! Retrying request executor.
//!
//! [`Transport`] sends one logical request through an [`HttpClient`], retrying
//! connection resets, broken pipes and timeouts under a bounded
//! [`RetryPolicy`]. Replies are parsed as JSON and classified: a body that is
//! not JSON is a malformed reply, and a body carrying an `error` field is an
//! engine-reported error. Neither is retried.
//!
//! The backoff wait is a `tokio` timer, so other requests keep running while
//! one is waiting to retry.

mod http;
mod retry;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::error::{SyncError, SyncResult};

pub use http::ReqwestClient;
pub use retry::RetryPolicy;

/// HTTP methods used against the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to issue (and re-issue) one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: String,
    /// Serialized JSON body.
    pub body: Option<String>,
    /// Basic-auth credentials.
    pub credentials: Option<Credentials>,
}

impl RequestSpec {
    /// Creates a request without body or credentials.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            credentials: None,
        }
    }

    /// Sets the body from a JSON value.
    pub fn with_json(mut self, body: &Value) -> Self {
        self.body = Some(body.to_string());
        self
    }

    /// Sets basic-auth credentials.
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A reply as received from the wire, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

/// Failure to obtain any reply from the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("broken pipe: {0}")]
    BrokenPipe(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl SendError {
    /// Returns true for the failure classes that are retried.
    pub fn is_transient(&self) -> bool {
        !matches!(self, SendError::Other(_))
    }
}

/// A single HTTP exchange. Implementations must not retry on their own.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends the request once.
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, SendError>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, SendError> {
        (**self).send(request).await
    }
}

/// A parsed, non-error reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body.
    pub body: Value,
    /// Attempts it took to get the reply.
    pub attempts: u32,
}

/// Executes requests with bounded retry.
#[derive(Debug, Clone)]
pub struct Transport<C = ReqwestClient> {
    client: C,
    policy: RetryPolicy,
}

impl Transport<ReqwestClient> {
    /// Creates a transport backed by `reqwest`.
    pub fn with_policy(policy: RetryPolicy) -> SyncResult<Self> {
        Ok(Self::new(ReqwestClient::new()?, policy))
    }
}

impl<C: HttpClient> Transport<C> {
    /// Creates a transport over any client.
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Returns the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying transient failures, and classifies the reply.
    pub async fn execute(&self, request: &RequestSpec) -> SyncResult<Reply> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let delay = self.policy.delay_before(attempts, &mut rand::rng());
            if !delay.is_zero() {
                sleep(delay).await;
            }

            debug!(request = %request, attempt = attempts, "Sending request");

            match self.client.send(request).await {
                Ok(raw) => return interpret(raw, attempts),
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    warn!(
                        request = %request,
                        attempt = attempts,
                        max_attempts = max_attempts,
                        error = %e,
                        "Request failed, retrying"
                    );
                }
                Err(e) => {
                    return Err(SyncError::Transport {
                        attempts,
                        request: Box::new(request.clone()),
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Parses a raw reply and surfaces engine-reported errors.
fn interpret(raw: RawResponse, attempts: u32) -> SyncResult<Reply> {
    let body: Value = serde_json::from_str(&raw.body).map_err(|_| SyncError::MalformedReply {
        status: raw.status,
        body: raw.body.clone(),
    })?;

    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(SyncError::Engine {
            status: raw.status,
            error: error.clone(),
        });
    }

    Ok(Reply {
        status: raw.status,
        body,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_interpret_success() {
        let reply = interpret(raw(200, r#"{"ok": true}"#), 2).unwrap();
        assert_eq!(reply.body, json!({"ok": true}));
        assert_eq!(reply.attempts, 2);
    }

    #[test]
    fn test_interpret_malformed() {
        let err = interpret(raw(502, "<html>Bad Gateway</html>"), 1).unwrap_err();
        match err {
            SyncError::MalformedReply { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_engine_error() {
        let err = interpret(
            raw(404, r#"{"error": "IndexMissingException[[cats] missing]", "status": 404}"#),
            1,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::Engine { status: 404, .. }));
    }

    #[test]
    fn test_interpret_null_error_is_success() {
        assert!(interpret(raw(200, r#"{"error": null, "hits": {}}"#), 1).is_ok());
    }

    #[test]
    fn test_send_error_classes() {
        assert!(SendError::ConnectionReset("reset".into()).is_transient());
        assert!(SendError::BrokenPipe("pipe".into()).is_transient());
        assert!(SendError::Timeout("slow".into()).is_transient());
        assert!(!SendError::Other("refused".into()).is_transient());
    }

    #[test]
    fn test_request_spec_display() {
        let spec = RequestSpec::new(HttpMethod::Delete, "http://localhost:9200/cats/cat/1");
        assert_eq!(spec.to_string(), "DELETE http://localhost:9200/cats/cat/1");

        let spec = spec.with_json(&json!({"a": 1}));
        assert_eq!(spec.body.as_deref(), Some(r#"{"a":1}"#));
    }
}
