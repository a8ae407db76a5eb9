//! Grouping (terms aggregation) request builder.
//!
//! Without filters the body carries a bare terms aggregation:
//!
//! ```json
//! { "from": 0, "size": 20, "aggs": { "grouped": { "terms": { "field": "breed", "size": 0 } } } }
//! ```
//!
//! With filters the terms aggregation is nested inside a filter aggregation,
//! which changes the reply envelope accordingly (see
//! [`AggregationResult::buckets`](crate::results::AggregationResult::buckets)).

use serde_json::{Value, json};

use super::builder::{ClauseSet, Occur};
use super::fragments::{fuzzy_fragments, range_fragments, term_fragments};
use super::options::{AggregationOptions, paging};

/// Name of the filter aggregation wrapping the grouping when filters exist.
pub const FILTER_AGGREGATION: &str = "filtered";

/// Name of the terms aggregation.
pub const GROUP_AGGREGATION: &str = "grouped";

/// Bucket count meaning "all buckets".
pub const UNLIMITED_BUCKETS: u64 = 0;

/// Builds the clause set for an aggregation option set.
pub fn build_agg_clauses(options: &AggregationOptions) -> ClauseSet {
    let mut clauses = ClauseSet::new();
    let fuzziness = options.fuzziness.as_ref();

    if let Some(ref fields) = options.must_fuzzy_match {
        clauses.extend(Occur::Must, fuzzy_fragments(fields, fuzziness));
    }
    if let Some(ref fields) = options.should_fuzzy_match {
        clauses.extend(Occur::Should, fuzzy_fragments(fields, fuzziness));
    }
    if let Some(ref fields) = options.must_match {
        clauses.extend(Occur::Must, term_fragments(fields));
    }
    if let Some(ref fields) = options.should_match {
        clauses.extend(Occur::Should, term_fragments(fields));
    }
    if let Some(ref fields) = options.must_range {
        clauses.extend(Occur::Must, range_fragments("mustRange", fields));
    }
    if let Some(ref fields) = options.should_range {
        clauses.extend(Occur::Should, range_fragments("shouldRange", fields));
    }

    clauses
}

/// Builds a complete aggregation request body.
pub fn build_agg_body(options: &AggregationOptions) -> Value {
    let (from, size) = paging(options.page, options.page_size);
    let clauses = build_agg_clauses(options);

    let grouping = json!({
        "terms": {
            "field": options.group_by,
            "size": UNLIMITED_BUCKETS,
        }
    });

    let aggs = if clauses.is_empty() {
        json!({ GROUP_AGGREGATION: grouping })
    } else {
        json!({
            FILTER_AGGREGATION: {
                "filter": { "bool": clauses.into_bool() },
                "aggs": { GROUP_AGGREGATION: grouping },
            }
        })
    };

    json!({
        "from": from,
        "size": size,
        "aggs": aggs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_shape() {
        let body = build_agg_body(&AggregationOptions::new("breed"));
        assert_eq!(
            body,
            json!({
                "from": 0,
                "size": 20,
                "aggs": { "grouped": { "terms": { "field": "breed", "size": 0 } } }
            })
        );
    }

    #[test]
    fn test_filtered_shape() {
        let options = AggregationOptions::new("breed")
            .with_must_match("breed", "Siamese")
            .with_page(1, 25);
        let body = build_agg_body(&options);

        assert_eq!(body["from"], json!(0));
        assert_eq!(body["size"], json!(25));
        assert_eq!(
            body["aggs"]["filtered"]["filter"]["bool"]["must"],
            json!([{ "term": { "breed": "siamese" } }])
        );
        assert_eq!(
            body["aggs"]["filtered"]["aggs"]["grouped"]["terms"]["field"],
            json!("breed")
        );
        assert!(body["aggs"].get("grouped").is_none());
    }

    #[test]
    fn test_should_only_filter_still_wraps() {
        let options = AggregationOptions::new("color").with_should_match("breed", "manx");
        let body = build_agg_body(&options);
        assert!(body["aggs"]["filtered"]["filter"]["bool"]["should"].is_array());
        assert!(body["aggs"]["filtered"]["filter"]["bool"].get("must").is_none());
    }

    #[test]
    fn test_non_object_range_does_not_wrap() {
        let options = AggregationOptions::new("color").with_must_range("age", json!(3));
        let body = build_agg_body(&options);
        assert!(body["aggs"].get("grouped").is_some());
    }
}
