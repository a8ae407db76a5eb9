//! Command line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCHSYNC_URL` | | Engine URL; may embed protocol, host, port and credentials |
//! | `SEARCHSYNC_PROTOCOL` | http | `http` or `https` |
//! | `SEARCHSYNC_HOST` | localhost | Engine host |
//! | `SEARCHSYNC_PORT` | 9200 | Engine port |
//! | `SEARCHSYNC_PREFIX` | | Index name prefix |
//! | `SEARCHSYNC_USERNAME` | | Basic-auth user |
//! | `SEARCHSYNC_PASSWORD` | | Basic-auth password |
//! | `SEARCHSYNC_DOC_TYPE` | | Document type (required) |
//! | `SEARCHSYNC_INDEX` | | Index name override |
//! | `SEARCHSYNC_MAX_ATTEMPTS` | 3 | Attempts per request |
//! | `SEARCHSYNC_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `SEARCHSYNC_LOG_LEVEL` | warn | Log level |

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use searchsync::config::{ConnectionSettings, SyncSettings};
use searchsync::transport::RetryPolicy;

/// Command line for a searchsync index.
#[derive(Debug, Clone, Parser)]
#[command(name = "searchsync")]
#[command(about = "Query and maintain a search index mirrored from a document store")]
pub struct CliConfig {
    /// Engine URL.
    #[arg(long, env = "SEARCHSYNC_URL")]
    pub url: Option<String>,

    /// Protocol (http or https).
    #[arg(long, env = "SEARCHSYNC_PROTOCOL")]
    pub protocol: Option<String>,

    /// Engine host.
    #[arg(long, env = "SEARCHSYNC_HOST")]
    pub host: Option<String>,

    /// Engine port.
    #[arg(long, env = "SEARCHSYNC_PORT")]
    pub port: Option<u16>,

    /// Index name prefix.
    #[arg(long, env = "SEARCHSYNC_PREFIX")]
    pub prefix: Option<String>,

    /// Basic-auth user.
    #[arg(long, env = "SEARCHSYNC_USERNAME")]
    pub username: Option<String>,

    /// Basic-auth password.
    #[arg(long, env = "SEARCHSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Document type.
    #[arg(short = 't', long, env = "SEARCHSYNC_DOC_TYPE")]
    pub doc_type: Option<String>,

    /// Index name, replacing the prefix-type derivation.
    #[arg(long, env = "SEARCHSYNC_INDEX")]
    pub index: Option<String>,

    /// Sub-document field to flatten when indexing.
    #[arg(long, env = "SEARCHSYNC_FLATTEN", requires = "grouper")]
    pub flatten: Option<String>,

    /// Field naming each flattened sub-document's group.
    #[arg(long, env = "SEARCHSYNC_GROUPER", requires = "flatten")]
    pub grouper: Option<String>,

    /// Attempts per request, including the first.
    #[arg(long, env = "SEARCHSYNC_MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: u32,

    /// Request timeout in seconds.
    #[arg(long, env = "SEARCHSYNC_TIMEOUT", default_value = "30")]
    pub timeout: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCHSYNC_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations offered on the command line.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a search from a JSON option set.
    Search {
        /// Option set file, or `-` for stdin.
        options: PathBuf,
    },

    /// Run a grouping aggregation from a JSON option set.
    Aggregate {
        /// Option set file, or `-` for stdin.
        options: PathBuf,
    },

    /// Index a JSON document under an id.
    Index {
        /// Document id.
        id: String,
        /// Document file, or `-` for stdin.
        document: PathBuf,
    },

    /// Remove a document from the index.
    Unindex {
        /// Document id.
        id: String,
    },

    /// Print the resolved endpoint addresses.
    Endpoints {
        /// Document id to resolve a document address for.
        id: Option<String>,
    },
}

impl CliConfig {
    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Validates arguments that clap cannot check on its own.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_attempts == 0 {
            errors.push("max_attempts must be at least 1".to_string());
        }
        if self.timeout == 0 {
            errors.push("timeout must be at least 1 second".to_string());
        }
        if self.doc_type.as_deref().is_none_or(|t| t.trim().is_empty()) {
            errors.push("doc_type is required (--doc-type or SEARCHSYNC_DOC_TYPE)".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the sparse synchronisation settings.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            connection: ConnectionSettings {
                url: self.url.clone(),
                protocol: self.protocol.clone(),
                host: self.host.clone(),
                port: self.port,
                prefix: self.prefix.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
            },
            index: self.index.clone(),
            doc_type: self.doc_type.clone(),
            flatten: self.flatten.clone(),
            grouper: self.grouper.clone(),
            retry: Some(RetryPolicy {
                max_attempts: self.max_attempts,
                ..Default::default()
            }),
        }
    }
}
