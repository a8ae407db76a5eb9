//! Error types for search synchronisation.
//!
//! Errors are split into configuration problems, which are detected before any
//! network call, and request failures, which carry enough context (attempt
//! count, original request, raw reply) to diagnose without re-running.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use serde_json::Value;
use thiserror::Error;

use crate::transport::RequestSpec;

/// Result alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

/// The primary error type for every search and indexing operation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration errors, raised before any request is sent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request could not be delivered.
    ///
    /// Transient failures (reset, broken pipe, timeout) only surface here once
    /// the attempt cap is exhausted.
    #[error("transport failure after {attempts} attempt(s) for {request}: {message}")]
    Transport {
        attempts: u32,
        request: Box<RequestSpec>,
        message: String,
    },

    /// The reply body was not valid JSON.
    #[error("malformed reply (status {status}): {body}")]
    MalformedReply { status: u16, body: String },

    /// The search engine answered with an `error` field.
    #[error("search engine error (status {status}): {error}")]
    Engine { status: u16, error: Value },

    /// A search or aggregation reply without a `hits` section.
    #[error("search reply is missing hits: {reply}")]
    MissingHits { reply: Value },

    /// A mutating call whose reply did not confirm success.
    #[error("request was not acknowledged: {reply}")]
    NotAcknowledged { reply: Value },
}

impl SyncError {
    /// Returns the number of attempts made, for errors raised by the transport.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            SyncError::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Returns true if this error was raised before any network activity.
    pub fn is_config(&self) -> bool {
        matches!(self, SyncError::Config(_))
    }
}

/// Errors in connection options or in an option set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No host could be resolved.
    #[error("no search engine host configured")]
    MissingHost,

    /// No port could be resolved.
    #[error("no search engine port configured")]
    MissingPort,

    /// The configured URL could not be parsed.
    #[error("invalid search engine url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// An explicit field disagrees with the value embedded in the URL.
    #[error("{field} '{explicit_value}' conflicts with '{url_value}' from the configured url")]
    UrlConflict {
        field: &'static str,
        url_value: String,
        explicit_value: String,
    },

    /// Only `http` and `https` are supported.
    #[error("unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },

    /// No document type was configured for the synchronised model.
    #[error("no document type configured")]
    MissingDocType,

    /// An array category received a value that is not an array.
    #[error("{category} expects an array for field '{field}'")]
    NotAnArray { category: &'static str, field: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    HttpClient { message: String },

    /// A document handed to the indexer has no usable identifier.
    #[error("document has no identifier")]
    MissingDocumentId,
}
