//! Endpoint addresses derived from connection options.
//!
//! | Endpoint | Shape |
//! |----------|-------|
//! | domain | `protocol://host[:port]` |
//! | index | `{domain}/{prefix}-{type}` or `{domain}/{type}` |
//! | type | `{index}/{type}` |
//! | document | `{type}/{id}` |
//! | search | `{domain}/{index}*/_search` |
//! | bulk | `{index}/_bulk` |
//! | alias | `{index}/_alias/{alias}` |
//! | aliases | `{domain}/_aliases` |

use url::Url;

use crate::config::{ConnectionOptions, SyncConfig};

/// Resolved endpoint addresses for one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    domain: String,
    index: String,
    doc_type: String,
}

/// Derives the index name: explicit override, else `{prefix}-{type}`, else
/// `{type}`. Index names are always lowercase.
pub fn index_name(connection: &ConnectionOptions, doc_type: &str, index: Option<&str>) -> String {
    let name = match (index, connection.prefix.as_deref()) {
        (Some(index), _) => index.to_string(),
        (None, Some(prefix)) => format!("{}-{}", prefix, doc_type),
        (None, None) => doc_type.to_string(),
    };
    name.to_lowercase()
}

impl Endpoints {
    /// Resolves endpoints for a document type.
    pub fn new(connection: &ConnectionOptions, doc_type: &str, index: Option<&str>) -> Self {
        Self {
            domain: connection.domain_uri(),
            index: index_name(connection, doc_type, index),
            doc_type: doc_type.to_string(),
        }
    }

    /// Resolves endpoints from a synchronisation config.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(&config.connection, &config.doc_type, config.index.as_deref())
    }

    /// Returns the index name.
    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Returns the document type.
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Returns `protocol://host[:port]`, plus any base path.
    pub fn domain_uri(&self) -> &str {
        &self.domain
    }

    /// Returns the index address.
    pub fn index_uri(&self) -> String {
        format!("{}/{}", self.domain, self.index)
    }

    /// Returns the document-type address inside the index.
    pub fn type_uri(&self) -> String {
        format!("{}/{}", self.index_uri(), self.doc_type)
    }

    /// Returns the document address; the id is percent-encoded as one path
    /// segment.
    pub fn document_uri(&self, id: &str) -> String {
        let type_uri = self.type_uri();
        match Url::parse(&type_uri) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.push(id);
                }
                url.into()
            }
            Err(_) => format!("{}/{}", type_uri, id),
        }
    }

    /// Search address, covering every index that starts with the index name.
    pub fn search_uri(&self) -> String {
        format!("{}/{}*/_search", self.domain, self.index)
    }

    /// Returns the bulk endpoint of the index.
    pub fn bulk_uri(&self) -> String {
        format!("{}/_bulk", self.index_uri())
    }

    /// Returns the address of an alias on the index.
    pub fn alias_uri(&self, alias: &str) -> String {
        format!("{}/_alias/{}", self.index_uri(), alias)
    }

    /// Returns the cluster-wide alias endpoint.
    pub fn aliases_uri(&self) -> String {
        format!("{}/_aliases", self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(prefix: Option<&str>) -> ConnectionOptions {
        ConnectionOptions {
            prefix: prefix.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_index_name() {
        assert_eq!(index_name(&connection(None), "Cats", None), "cats");
        assert_eq!(index_name(&connection(Some("App")), "cats", None), "app-cats");
        assert_eq!(
            index_name(&connection(Some("app")), "cats", Some("Felines")),
            "felines"
        );
    }

    #[test]
    fn test_endpoint_chain() {
        let endpoints = Endpoints::new(&connection(Some("app")), "cat", None);
        assert_eq!(endpoints.domain_uri(), "http://localhost:9200");
        assert_eq!(endpoints.index_uri(), "http://localhost:9200/app-cat");
        assert_eq!(endpoints.type_uri(), "http://localhost:9200/app-cat/cat");
        assert_eq!(
            endpoints.document_uri("507f1f77bcf86cd799439011"),
            "http://localhost:9200/app-cat/cat/507f1f77bcf86cd799439011"
        );
        assert_eq!(
            endpoints.search_uri(),
            "http://localhost:9200/app-cat*/_search"
        );
        assert_eq!(endpoints.bulk_uri(), "http://localhost:9200/app-cat/_bulk");
        assert_eq!(
            endpoints.alias_uri("live"),
            "http://localhost:9200/app-cat/_alias/live"
        );
        assert_eq!(endpoints.aliases_uri(), "http://localhost:9200/_aliases");
    }

    #[test]
    fn test_document_id_is_encoded() {
        let endpoints = Endpoints::new(&connection(None), "cat", None);
        assert_eq!(
            endpoints.document_uri("a/b c"),
            "http://localhost:9200/cat/cat/a%2Fb%20c"
        );
    }

    #[test]
    fn test_base_path() {
        let connection = ConnectionOptions {
            protocol: "https".to_string(),
            host: "es.example.com".to_string(),
            port: 443,
            base_path: "engine".to_string(),
            ..Default::default()
        };
        let endpoints = Endpoints::new(&connection, "cat", None);
        assert_eq!(endpoints.type_uri(), "https://es.example.com/engine/cat/cat");
    }
}
