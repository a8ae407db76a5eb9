//! Query fragments and the per-category generators that produce them.
//!
//! A [`Fragment`] is one leaf clause of the final boolean query. The
//! generators in this module each handle one family of option-set categories
//! and never decide whether their output lands in `must` or `should`; that is
//! the builder's job.

use serde_json::{Map, Value, json};
use tracing::warn;

use super::options::{DEFAULT_FUZZINESS, FieldValues};
use crate::error::ConfigError;

/// Field every document's text is indexed into.
pub const CATCH_ALL_FIELD: &str = "_all";

/// Boost of exact matches and negations.
pub const EXACT_BOOST: u32 = 3;

/// Boost of fuzzy matches.
pub const FUZZY_BOOST: u32 = 1;

/// One leaf clause of a search or filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Exact `term` filter.
    Term { field: String, value: Value },

    /// `terms` filter over a set of values.
    Terms { field: String, values: Vec<Value> },

    /// `range` filter; the expression is passed through untouched.
    Range {
        field: String,
        expression: Map<String, Value>,
    },

    /// `match_phrase` query.
    Phrase { field: String, phrase: Value },

    /// `multi_match` query on one field.
    MultiMatch {
        field: String,
        query: Value,
        boost: u32,
        fuzziness: Option<Value>,
    },

    /// `bool.must_not` around a `multi_match` that matches everything when the
    /// analyzed query is empty.
    Negation { field: String, query: Value },

    /// `match` against the catch-all field.
    CatchAll { query: Value },

    /// `match_all` query.
    MatchAll,
}

impl Fragment {
    /// Renders the fragment as engine query DSL.
    pub fn to_value(&self) -> Value {
        match self {
            Fragment::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Fragment::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Fragment::Range { field, expression } => {
                json!({ "range": { field.as_str(): expression } })
            }
            Fragment::Phrase { field, phrase } => {
                json!({ "match_phrase": { field.as_str(): phrase } })
            }
            Fragment::MultiMatch {
                field,
                query,
                boost,
                fuzziness,
            } => {
                let mut multi_match = json!({
                    "query": query,
                    "fields": [field],
                    "boost": boost,
                });
                if let Some(fuzziness) = fuzziness {
                    multi_match["fuzziness"] = fuzziness.clone();
                }
                json!({ "multi_match": multi_match })
            }
            Fragment::Negation { field, query } => json!({
                "bool": {
                    "must_not": [{
                        "multi_match": {
                            "query": query,
                            "fields": [field],
                            "zero_terms_query": "all",
                            "boost": EXACT_BOOST,
                        }
                    }]
                }
            }),
            Fragment::CatchAll { query } => json!({ "match": { CATCH_ALL_FIELD: query } }),
            Fragment::MatchAll => json!({ "match_all": {} }),
        }
    }
}

/// Yields each element of an array value, or the value itself.
fn explode(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn case_fold(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_lowercase()),
        other => other.clone(),
    }
}

/// `mustMatch` / `shouldMatch`: one `term` filter per value, strings lower-cased.
pub fn term_fragments(fields: &FieldValues) -> Vec<Fragment> {
    fields
        .iter()
        .flat_map(|(field, value)| {
            explode(value).into_iter().map(move |v| Fragment::Term {
                field: field.clone(),
                value: case_fold(v),
            })
        })
        .collect()
}

/// `mustMatchPhrase`: one `match_phrase` per entry.
pub fn phrase_fragments(fields: &FieldValues) -> Vec<Fragment> {
    fields
        .iter()
        .flat_map(|(field, value)| {
            explode(value).into_iter().map(move |v| Fragment::Phrase {
                field: field.clone(),
                phrase: v.clone(),
            })
        })
        .collect()
}

/// `mustFuzzyMatch` / `shouldFuzzyMatch`: an exact and a fuzzy `multi_match`
/// per value.
pub fn fuzzy_fragments(fields: &FieldValues, fuzziness: Option<&Value>) -> Vec<Fragment> {
    let fuzziness = fuzziness
        .cloned()
        .unwrap_or_else(|| Value::String(DEFAULT_FUZZINESS.to_string()));

    fields
        .iter()
        .flat_map(|(field, value)| {
            let fuzziness = fuzziness.clone();
            explode(value).into_iter().flat_map(move |v| {
                [
                    Fragment::MultiMatch {
                        field: field.clone(),
                        query: v.clone(),
                        boost: EXACT_BOOST,
                        fuzziness: None,
                    },
                    Fragment::MultiMatch {
                        field: field.clone(),
                        query: v.clone(),
                        boost: FUZZY_BOOST,
                        fuzziness: Some(fuzziness.clone()),
                    },
                ]
            })
        })
        .collect()
}

/// `mustNotMatch` / `shouldNotMatch`: one negation wrapper per value.
pub fn negation_fragments(fields: &FieldValues) -> Vec<Fragment> {
    fields
        .iter()
        .flat_map(|(field, value)| {
            explode(value).into_iter().map(move |v| Fragment::Negation {
                field: field.clone(),
                query: v.clone(),
            })
        })
        .collect()
}

/// `mustAllMatch` / `shouldAllMatch`: one catch-all `match` per value.
pub fn catch_all_fragments(value: &Value) -> Vec<Fragment> {
    explode(value)
        .into_iter()
        .map(|v| Fragment::CatchAll { query: v.clone() })
        .collect()
}

/// `mustRange` / `shouldRange`: one `range` filter per field.
///
/// Values that are not objects are dropped with a warning.
pub fn range_fragments(category: &'static str, fields: &FieldValues) -> Vec<Fragment> {
    fields
        .iter()
        .filter_map(|(field, value)| match value {
            Value::Object(expression) => Some(Fragment::Range {
                field: field.clone(),
                expression: expression.clone(),
            }),
            other => {
                warn!(
                    category = category,
                    field = %field,
                    value = %other,
                    "Ignoring range value that is not an object"
                );
                None
            }
        })
        .collect()
}

/// `mustArray` / `shouldArray`: one `terms` filter per field.
///
/// Fails if any value is not an array.
pub fn array_fragments(
    category: &'static str,
    fields: &FieldValues,
) -> Result<Vec<Fragment>, ConfigError> {
    fields
        .iter()
        .map(|(field, value)| match value {
            Value::Array(values) => Ok(Fragment::Terms {
                field: field.clone(),
                values: values.clone(),
            }),
            _ => Err(ConfigError::NotAnArray {
                category,
                field: field.clone(),
            }),
        })
        .collect()
}
