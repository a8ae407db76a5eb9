//! Normalisation of search engine replies.
//!
//! Replies are reshaped into [`SearchResult`] / [`AggregationResult`], which
//! always carry a `total` and a (possibly empty) `hits` list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};
use crate::query::aggregation::{FILTER_AGGREGATION, GROUP_AGGREGATION};

/// Normalised search reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matching documents.
    pub total: u64,
    /// Raw hit records, in engine order.
    pub hits: Vec<Value>,
}

/// Normalised aggregation reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Total number of matching documents.
    pub total: u64,
    /// Raw hit records, in engine order.
    pub hits: Vec<Value>,
    /// The reply's `aggregations` section, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Value>,
}

impl AggregationResult {
    /// Returns the grouping buckets from either aggregation envelope.
    pub fn buckets(&self) -> Vec<Value> {
        let Some(aggregation) = self.aggregation.as_ref() else {
            return Vec::new();
        };

        let grouped = aggregation
            .get(FILTER_AGGREGATION)
            .and_then(|filtered| filtered.get(GROUP_AGGREGATION))
            .or_else(|| aggregation.get(GROUP_AGGREGATION));

        grouped
            .and_then(|g| g.get("buckets"))
            .and_then(|b| b.as_array())
            .cloned()
            .unwrap_or_default()
    }
}

/// Reads `hits.total`, accepting both a bare count and `{"value": n}`.
fn read_total(hits: &Value) -> u64 {
    match hits.get("total") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::Object(total)) => total.get("value").and_then(|v| v.as_u64()).unwrap_or(0),
        _ => 0,
    }
}

fn read_hits(reply: &Value) -> SyncResult<(u64, Vec<Value>)> {
    if let Some(error) = reply.get("error").filter(|e| !e.is_null()) {
        return Err(SyncError::Engine {
            status: reply
                .get("status")
                .and_then(|s| s.as_u64())
                .and_then(|s| u16::try_from(s).ok())
                .unwrap_or(0),
            error: error.clone(),
        });
    }

    let hits = reply.get("hits").ok_or_else(|| SyncError::MissingHits {
        reply: reply.clone(),
    })?;

    let list = hits
        .get("hits")
        .and_then(|h| h.as_array())
        .cloned()
        .unwrap_or_default();

    Ok((read_total(hits), list))
}

/// Normalises a search reply.
pub fn normalize_search_reply(reply: &Value) -> SyncResult<SearchResult> {
    let (total, hits) = read_hits(reply)?;
    Ok(SearchResult { total, hits })
}

/// Normalises an aggregation reply, surfacing `aggregations` verbatim.
pub fn normalize_agg_reply(reply: &Value) -> SyncResult<AggregationResult> {
    let (total, hits) = read_hits(reply)?;
    Ok(AggregationResult {
        total,
        hits,
        aggregation: reply.get("aggregations").cloned(),
    })
}

/// Returns true if a mutating call's reply confirms success.
///
/// Accepted forms: `ok: true`, `acknowledged: true`, bulk-style
/// `total == successful`, or a `_shards` section without failures.
pub fn is_acknowledged(reply: &Value) -> bool {
    let flag = |key: &str| reply.get(key).and_then(|v| v.as_bool()).unwrap_or(false);
    if flag("ok") || flag("acknowledged") {
        return true;
    }

    if let (Some(total), Some(successful)) = (
        reply.get("total").and_then(|v| v.as_u64()),
        reply.get("successful").and_then(|v| v.as_u64()),
    ) {
        return total == successful;
    }

    reply
        .get("_shards")
        .map(|shards| {
            let failed = shards.get("failed").and_then(|v| v.as_u64()).unwrap_or(0);
            let successful = shards.get("successful").and_then(|v| v.as_u64()).unwrap_or(0);
            failed == 0 && successful > 0
        })
        .unwrap_or(false)
}
