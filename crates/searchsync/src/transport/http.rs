//! `reqwest`-backed [`HttpClient`].

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};

use super::{HttpClient, HttpMethod, RawResponse, RequestSpec, SendError};
use crate::error::{ConfigError, SyncResult};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client that opens a fresh connection for every request.
///
/// Idle pooling is disabled, so no connection outlives the exchange that
/// opened it.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> SyncResult<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Maps a `reqwest` failure onto the retry classes.
fn classify(err: reqwest::Error) -> SendError {
    let message = err.to_string();
    if err.is_timeout() {
        return SendError::Timeout(message);
    }

    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    return SendError::ConnectionReset(message);
                }
                io::ErrorKind::BrokenPipe => return SendError::BrokenPipe(message),
                io::ErrorKind::TimedOut => return SendError::Timeout(message),
                _ => {}
            }
        }
        source = cause.source();
    }

    SendError::Other(message)
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: &RequestSpec) -> Result<RawResponse, SendError> {
        let mut builder = self
            .client
            .request(to_method(request.method), &request.url)
            .header(ACCEPT, "application/json");

        if let Some(ref body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        if let Some(ref credentials) = request.credentials {
            builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(RawResponse { status, body })
    }
}
