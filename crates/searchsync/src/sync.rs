//! Keeps a search index in step with a document store.
//!
//! The document-model layer owns the lifecycle and calls into
//! [`SearchSync`] explicitly:
//!
//! - [`SearchSync::on_persisted`] after a document was saved
//! - [`SearchSync::on_removed`] after a document was deleted
//!
//! Each call returns its outcome. When an event channel is attached, the
//! outcome is also published as a [`SyncEvent`].
//!
//! # Example
//!
//! ```no_run
//! use searchsync::config::{SyncConfig, SyncSettings};
//! use searchsync::query::SearchOptions;
//! use searchsync::sync::SearchSync;
//!
//! # async fn run() -> searchsync::error::SyncResult<()> {
//! let config = SyncConfig::resolve(&SyncSettings {
//!     doc_type: Some("cat".to_string()),
//!     ..Default::default()
//! })?;
//! let sync = SearchSync::new(config)?;
//!
//! let result = sync
//!     .search(&SearchOptions::new().with_must_match("breed", "Siamese"))
//!     .await?;
//! println!("{} cats", result.total);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::SyncConfig;
use crate::error::{ConfigError, SyncError, SyncResult};
use crate::query::{AggregationOptions, SearchOptions, build_agg_body, build_search_body};
use crate::results::{
    AggregationResult, SearchResult, is_acknowledged, normalize_agg_reply, normalize_search_reply,
};
use crate::serializer::{DocValue, serialize_model};
use crate::transport::{HttpClient, HttpMethod, ReqwestClient, RequestSpec, Transport};
use crate::uri::Endpoints;

/// Which mutating operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    /// Write a document.
    Index,
    /// Remove a document.
    Unindex,
}

/// Completion signal for index and unindex calls.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A document was written to the index.
    Indexed {
        /// Document ID.
        id: String,
        /// Engine reply.
        reply: Value,
    },

    /// A document was removed from the index.
    Unindexed {
        /// Document ID.
        id: String,
        /// Engine reply.
        reply: Value,
    },

    /// An index or unindex call failed.
    Failed {
        /// Document ID.
        id: String,
        /// The failed operation.
        operation: SyncOperation,
        /// Rendered error.
        error: String,
    },
}

impl SyncEvent {
    /// Returns the document ID this event refers to.
    pub fn id(&self) -> &str {
        match self {
            SyncEvent::Indexed { id, .. } => id,
            SyncEvent::Unindexed { id, .. } => id,
            SyncEvent::Failed { id, .. } => id,
        }
    }
}

/// A domain object that can be mirrored into the index.
pub trait Indexable {
    /// Identifier the document is stored under, if it has one yet.
    fn search_id(&self) -> Option<String>;

    /// The document to serialize.
    fn search_document(&self) -> DocValue;
}

impl Indexable for DocValue {
    fn search_id(&self) -> Option<String> {
        match self.get("_id")? {
            DocValue::Id(id) => Some(id.to_hex()),
            DocValue::Scalar(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            DocValue::Scalar(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn search_document(&self) -> DocValue {
        self.clone()
    }
}

/// Search synchronisation for one document type.
///
/// Cloning is cheap; clones share configuration and transport. No state is
/// mutated after construction, so clones may be used concurrently.
pub struct SearchSync<C = ReqwestClient> {
    config: Arc<SyncConfig>,
    endpoints: Arc<Endpoints>,
    transport: Arc<Transport<C>>,
    events: Option<mpsc::UnboundedSender<SyncEvent>>,
}

impl<C> Clone for SearchSync<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            endpoints: Arc::clone(&self.endpoints),
            transport: Arc::clone(&self.transport),
            events: self.events.clone(),
        }
    }
}

impl<C> std::fmt::Debug for SearchSync<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSync")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints)
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

impl SearchSync<ReqwestClient> {
    /// Creates a synchroniser backed by `reqwest`.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let client = ReqwestClient::new()?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: HttpClient> SearchSync<C> {
    /// Creates a synchroniser over any HTTP client.
    pub fn with_client(config: SyncConfig, client: C) -> Self {
        let endpoints = Endpoints::from_config(&config);
        let transport = Transport::new(client, config.retry.clone());
        Self {
            config: Arc::new(config),
            endpoints: Arc::new(endpoints),
            transport: Arc::new(transport),
            events: None,
        }
    }

    /// Publishes completion events to `sender`.
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<SyncEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Attaches a fresh event channel and returns its receiving end.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.events = Some(sender);
        receiver
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the resolved endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(ref sender) = self.events {
            // A dropped receiver only means nobody is listening.
            let _ = sender.send(event);
        }
    }

    fn request(&self, method: HttpMethod, url: String) -> RequestSpec {
        RequestSpec::new(method, url).with_credentials(self.config.connection.credentials.clone())
    }

    /// Builds the payload sent for a document: the serialized model without
    /// its top-level `_id`.
    pub fn payload(&self, document: &DocValue) -> Value {
        let mut payload = serialize_model(document, &self.config.serialize);
        if let Some(fields) = payload.as_object_mut() {
            fields.remove("_id");
        }
        payload
    }

    /// Called by the document layer after a document was saved.
    pub async fn on_persisted<D: Indexable + ?Sized>(&self, document: &D) -> SyncResult<Value> {
        let id = document
            .search_id()
            .ok_or(SyncError::Config(ConfigError::MissingDocumentId))?;
        self.index(&id, &document.search_document()).await
    }

    /// Called by the document layer after a document was deleted.
    pub async fn on_removed(&self, id: &str) -> SyncResult<Value> {
        self.unindex(id).await
    }

    /// Writes a document to the index.
    pub async fn index(&self, id: &str, document: &DocValue) -> SyncResult<Value> {
        let spec = self
            .request(HttpMethod::Put, self.endpoints.document_uri(id))
            .with_json(&self.payload(document));

        match self.mutate(&spec).await {
            Ok(reply) => {
                info!(id = %id, index = %self.endpoints.index_name(), "Document indexed");
                self.emit(SyncEvent::Indexed {
                    id: id.to_string(),
                    reply: reply.clone(),
                });
                Ok(reply)
            }
            Err(e) => {
                error!(id = %id, error = %e, "Failed to index document");
                self.emit(SyncEvent::Failed {
                    id: id.to_string(),
                    operation: SyncOperation::Index,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Removes a document from the index.
    pub async fn unindex(&self, id: &str) -> SyncResult<Value> {
        let spec = self.request(HttpMethod::Delete, self.endpoints.document_uri(id));

        match self.mutate(&spec).await {
            Ok(reply) => {
                info!(id = %id, index = %self.endpoints.index_name(), "Document unindexed");
                self.emit(SyncEvent::Unindexed {
                    id: id.to_string(),
                    reply: reply.clone(),
                });
                Ok(reply)
            }
            Err(e) => {
                error!(id = %id, error = %e, "Failed to unindex document");
                self.emit(SyncEvent::Failed {
                    id: id.to_string(),
                    operation: SyncOperation::Unindex,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn mutate(&self, spec: &RequestSpec) -> SyncResult<Value> {
        let reply = self.transport.execute(spec).await?;
        if is_acknowledged(&reply.body) {
            Ok(reply.body)
        } else {
            Err(SyncError::NotAcknowledged { reply: reply.body })
        }
    }

    /// Runs a search.
    pub async fn search(&self, options: &SearchOptions) -> SyncResult<SearchResult> {
        let body = build_search_body(options)?;
        debug!(body = %body, "Executing search");

        let spec = self
            .request(HttpMethod::Post, self.endpoints.search_uri())
            .with_json(&body);
        let reply = self.transport.execute(&spec).await?;
        normalize_search_reply(&reply.body)
    }

    /// Runs a grouping aggregation.
    pub async fn aggregate(&self, options: &AggregationOptions) -> SyncResult<AggregationResult> {
        let body = build_agg_body(options);
        debug!(body = %body, "Executing aggregation");

        let spec = self
            .request(HttpMethod::Post, self.endpoints.search_uri())
            .with_json(&body);
        let reply = self.transport.execute(&spec).await?;
        normalize_agg_reply(&reply.body)
    }
}
