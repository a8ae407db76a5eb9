//! Query and aggregation builder tests.
//!
//! Builders are pure, so these run without any engine.

use searchsync::error::ConfigError;
use searchsync::query::aggregation::{FILTER_AGGREGATION, GROUP_AGGREGATION};
use searchsync::query::{AggregationOptions, SearchOptions, build_agg_body, build_search_body};
use serde_json::{Value, json};

fn must(body: &Value) -> &Vec<Value> {
    body["query"]["bool"]["must"]
        .as_array()
        .expect("must list present")
}

fn should(body: &Value) -> &Vec<Value> {
    body["query"]["bool"]["should"]
        .as_array()
        .expect("should list present")
}

// ============================================================================
// Term Filters
// ============================================================================

#[test]
fn test_single_must_match_is_lowercased() {
    for input in ["X", "Siamese", "MAINE COON", "already lower"] {
        let options = SearchOptions::new().with_must_match("breed", input);
        let body = build_search_body(&options).unwrap();

        assert_eq!(must(&body).len(), 1);
        assert_eq!(
            must(&body)[0],
            json!({ "term": { "breed": input.to_lowercase() } })
        );
        assert!(body["query"]["bool"].get("should").is_none());
    }
}

#[test]
fn test_array_values_explode_in_order() {
    let options = SearchOptions::new().with_should_match("color", json!(["Black", "White", 3]));
    let body = build_search_body(&options).unwrap();

    assert_eq!(
        should(&body),
        &vec![
            json!({ "term": { "color": "black" } }),
            json!({ "term": { "color": "white" } }),
            json!({ "term": { "color": 3 } }),
        ]
    );
}

#[test]
fn test_fields_keep_their_values() {
    let options = SearchOptions::new()
        .with_must_match("breed", json!(["A", "B"]))
        .with_must_match("color", "C");
    let body = build_search_body(&options).unwrap();

    assert_eq!(
        must(&body),
        &vec![
            json!({ "term": { "breed": "a" } }),
            json!({ "term": { "breed": "b" } }),
            json!({ "term": { "color": "c" } }),
        ]
    );
}

#[test]
fn test_fields_follow_caller_order() {
    let options: SearchOptions = serde_json::from_value(json!({
        "mustMatch": { "zeta": "A", "alpha": ["B", "C"] },
        "mustNotMatch": { "status": "archived", "owner": "nobody" }
    }))
    .unwrap();
    let body = build_search_body(&options).unwrap();

    let clauses = must(&body);
    assert_eq!(clauses.len(), 5);
    assert_eq!(
        clauses[0]["bool"]["must_not"][0]["multi_match"]["fields"],
        json!(["status"])
    );
    assert_eq!(
        clauses[1]["bool"]["must_not"][0]["multi_match"]["fields"],
        json!(["owner"])
    );
    assert_eq!(
        &clauses[2..],
        &[
            json!({ "term": { "zeta": "a" } }),
            json!({ "term": { "alpha": "b" } }),
            json!({ "term": { "alpha": "c" } }),
        ]
    );
}

// ============================================================================
// Paging And Determinism
// ============================================================================

#[test]
fn test_paging_math() {
    for page in 1..=5u64 {
        for size in [1u64, 10, 25] {
            let body = build_search_body(&SearchOptions::new().with_page(page, size)).unwrap();
            assert_eq!(body["from"], json!((page - 1) * size));
            assert_eq!(body["size"], json!(size));
        }
    }
}

#[test]
fn test_default_paging() {
    let body = build_search_body(&SearchOptions::new()).unwrap();
    assert_eq!(body["from"], json!(0));
    assert_eq!(body["size"], json!(20));
}

#[test]
fn test_building_is_idempotent() {
    let options: SearchOptions = serde_json::from_value(json!({
        "mustMatch": { "breed": ["Siamese", "Persian"] },
        "shouldFuzzyMatch": { "name": "Felix" },
        "mustNotMatch": { "status": "archived" },
        "shouldAllMatch": ["tabby", "orange"],
        "mustRange": { "age": { "gte": 2 } },
        "mustArray": { "tags": ["indoor"] },
        "matchAll": true,
        "sort": [{ "age": "desc" }],
        "page": 3,
        "pageSize": 5
    }))
    .unwrap();
    let before = options.clone();

    let first = build_search_body(&options).unwrap();
    let second = build_search_body(&options).unwrap();

    assert_eq!(first, second);
    assert_eq!(options, before);
    assert_eq!(first["sort"], json!([{ "age": "desc" }]));
}

// ============================================================================
// Category Semantics
// ============================================================================

#[test]
fn test_negation_clause() {
    let options = SearchOptions::new().with_must_not_match("status", "archived");
    let body = build_search_body(&options).unwrap();

    assert_eq!(must(&body).len(), 1);
    let clause = &must(&body)[0];
    let negated = clause["bool"]["must_not"].as_array().unwrap();
    assert_eq!(negated.len(), 1);
    assert_eq!(negated[0]["multi_match"]["fields"], json!(["status"]));
    assert_eq!(negated[0]["multi_match"]["query"], json!("archived"));
}

#[test]
fn test_fuzzy_emits_exact_and_fuzzy_pair() {
    let options = SearchOptions::new()
        .with_must_fuzzy_match("name", "Felix")
        .with_fuzziness(2);
    let body = build_search_body(&options).unwrap();

    let clauses = must(&body);
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0]["multi_match"]["boost"], json!(3));
    assert!(clauses[0]["multi_match"].get("fuzziness").is_none());
    assert_eq!(clauses[1]["multi_match"]["boost"], json!(1));
    assert_eq!(clauses[1]["multi_match"]["fuzziness"], json!(2));
}

#[test]
fn test_range_passes_expression_through() {
    let options = SearchOptions::new()
        .with_must_range("age", json!({ "gte": 2, "lt": 10 }))
        .with_should_range("weight", "heavy");
    let body = build_search_body(&options).unwrap();

    assert_eq!(
        must(&body),
        &vec![json!({ "range": { "age": { "gte": 2, "lt": 10 } } })]
    );
    // Non-object range values are dropped.
    assert!(body["query"]["bool"].get("should").is_none());
}

#[test]
fn test_array_category_requires_array() {
    let options = SearchOptions::new().with_must_array("tags", "indoor");
    let err = build_search_body(&options).unwrap_err();
    assert_eq!(
        err,
        ConfigError::NotAnArray {
            category: "mustArray",
            field: "tags".to_string()
        }
    );

    let options = SearchOptions::new().with_must_array("tags", json!(["indoor", "senior"]));
    let body = build_search_body(&options).unwrap();
    assert_eq!(
        must(&body),
        &vec![json!({ "terms": { "tags": ["indoor", "senior"] } })]
    );
}

#[test]
fn test_catch_all_and_match_all() {
    let options: SearchOptions = serde_json::from_value(json!({
        "mustAllMatch": "tabby",
        "matchAll": true
    }))
    .unwrap();
    let body = build_search_body(&options).unwrap();

    assert_eq!(
        must(&body),
        &vec![
            json!({ "match": { "_all": "tabby" } }),
            json!({ "match_all": {} }),
        ]
    );
}

#[test]
fn test_category_order_is_fixed() {
    let options: SearchOptions = serde_json::from_value(json!({
        "matchAll": true,
        "mustArray": { "tags": ["a"] },
        "mustRange": { "age": { "gt": 1 } },
        "mustAllMatch": "x",
        "mustNotMatch": { "status": "gone" },
        "mustFuzzyMatch": { "name": "y" },
        "mustMatchPhrase": { "bio": "likes fish" },
        "mustMatch": { "breed": "z" }
    }))
    .unwrap();
    let body = build_search_body(&options).unwrap();

    let kinds: Vec<String> = must(&body)
        .iter()
        .map(|clause| clause.as_object().unwrap().keys().next().unwrap().clone())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "bool",
            "multi_match",
            "multi_match",
            "match",
            "term",
            "match_phrase",
            "terms",
            "range",
            "match_all",
        ]
    );
}

// ============================================================================
// Aggregations
// ============================================================================

#[test]
fn test_filtered_aggregation_scenario() {
    let options = AggregationOptions::new("breed")
        .with_must_match("breed", "siamese")
        .with_page(1, 25);
    let body = build_agg_body(&options);

    assert_eq!(body["from"], json!(0));
    assert_eq!(body["size"], json!(25));

    let wrapper = &body["aggs"][FILTER_AGGREGATION];
    assert_eq!(
        wrapper["filter"]["bool"]["must"],
        json!([{ "term": { "breed": "siamese" } }])
    );
    assert_eq!(
        wrapper["aggs"][GROUP_AGGREGATION]["terms"]["field"],
        json!("breed")
    );
}

#[test]
fn test_bare_aggregation() {
    let body = build_agg_body(&AggregationOptions::new("color"));

    assert_eq!(
        body,
        json!({
            "from": 0,
            "size": 20,
            "aggs": { "grouped": { "terms": { "field": "color", "size": 0 } } }
        })
    );
}
