//! Search index synchronisation for document stores.
//!
//! This crate mirrors documents from a document store into a search engine
//! that speaks the Elasticsearch HTTP/JSON dialect, and queries them back.
//!
//! # Architecture
//!
//! - [`config`] - Connection and per-model settings, resolved up front
//! - [`query`] - Pure translation of option sets into query DSL
//! - [`transport`] - HTTP exchange with bounded, non-blocking retry
//! - [`results`] - Normalisation of engine replies
//! - [`serializer`] - Conversion of documents into engine-safe JSON
//! - [`uri`] - Endpoint addresses for a document type
//! - [`sync`] - Index/unindex/search/aggregate bound to one model
//! - [`error`] - Error types for all operations
//!
//! # Building queries
//!
//! Query building does no I/O and can be used on its own:
//!
//! ```
//! use searchsync::query::{SearchOptions, build_search_body};
//! use serde_json::json;
//!
//! let options = SearchOptions::new()
//!     .with_must_match("breed", "Siamese")
//!     .with_page(2, 10);
//! let body = build_search_body(&options).unwrap();
//!
//! assert_eq!(body["from"], json!(10));
//! assert_eq!(
//!     body["query"]["bool"]["must"][0],
//!     json!({ "term": { "breed": "siamese" } })
//! );
//! ```
//!
//! # Synchronising documents
//!
//! ```no_run
//! use searchsync::config::{SyncConfig, SyncSettings};
//! use searchsync::serializer::DocValue;
//! use searchsync::sync::SearchSync;
//! use serde_json::json;
//!
//! # async fn run() -> searchsync::SyncResult<()> {
//! let config = SyncConfig::resolve(&SyncSettings {
//!     doc_type: Some("cat".to_string()),
//!     ..Default::default()
//! })?;
//! let sync = SearchSync::new(config)?;
//!
//! let doc = DocValue::from(json!({ "_id": "felix", "breed": "Siamese" }));
//! sync.on_persisted(&doc).await?;
//! sync.on_removed("felix").await?;
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod query;
pub mod results;
pub mod serializer;
pub mod sync;
pub mod transport;
pub mod uri;

// Re-export commonly used types at crate root
pub use config::{ConnectionOptions, ConnectionSettings, SyncConfig, SyncSettings};
pub use error::{ConfigError, SyncError, SyncResult};
pub use query::{AggregationOptions, SearchOptions};
pub use results::{AggregationResult, SearchResult};
pub use serializer::{DocValue, ObjectId};
pub use sync::{Indexable, SearchSync, SyncEvent, SyncOperation};
pub use transport::{HttpClient, RetryPolicy, Transport};
pub use uri::Endpoints;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
