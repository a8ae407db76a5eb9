//! Search request body builder.
//!
//! Translates a [`SearchOptions`] into engine query DSL:
//!
//! ```json
//! {
//!   "query": { "bool": { "must": [...], "should": [...] } },
//!   "from": 0,
//!   "size": 20,
//!   "sort": ...
//! }
//! ```
//!
//! Categories are processed in a fixed order (negation, fuzzy, catch-all,
//! term, phrase, array, range, then `matchAll`), and fields within a category
//! in insertion order, so the same option set always produces the same body.

use serde_json::{Map, Value, json};

use super::fragments::{
    Fragment, array_fragments, catch_all_fragments, fuzzy_fragments, negation_fragments,
    phrase_fragments, range_fragments, term_fragments,
};
use super::options::{SearchOptions, paging};
use crate::error::ConfigError;

/// Which boolean list a category's fragments are appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
}

/// Accumulated `must` and `should` clauses of one boolean query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseSet {
    must: Vec<Value>,
    should: Vec<Value>,
}

impl ClauseSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rendered fragments to the list chosen by `occur`.
    pub fn extend(&mut self, occur: Occur, fragments: impl IntoIterator<Item = Fragment>) {
        let target = match occur {
            Occur::Must => &mut self.must,
            Occur::Should => &mut self.should,
        };
        target.extend(fragments.into_iter().map(|f| f.to_value()));
    }

    /// Returns the `must` clauses.
    pub fn must(&self) -> &[Value] {
        &self.must
    }

    /// Returns the `should` clauses.
    pub fn should(&self) -> &[Value] {
        &self.should
    }

    /// Returns true if no clause was produced.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty()
    }

    /// Renders `{ "must"?: [...], "should"?: [...] }`; empty lists are omitted.
    pub fn into_bool(self) -> Value {
        let mut bool_query = Map::new();
        if !self.must.is_empty() {
            bool_query.insert("must".to_string(), Value::Array(self.must));
        }
        if !self.should.is_empty() {
            bool_query.insert("should".to_string(), Value::Array(self.should));
        }
        Value::Object(bool_query)
    }
}

/// Builds the clause set for a search option set.
pub fn build_clauses(options: &SearchOptions) -> Result<ClauseSet, ConfigError> {
    let mut clauses = ClauseSet::new();
    let fuzziness = options.fuzziness.as_ref();

    if let Some(ref fields) = options.must_not_match {
        clauses.extend(Occur::Must, negation_fragments(fields));
    }
    if let Some(ref fields) = options.should_not_match {
        clauses.extend(Occur::Should, negation_fragments(fields));
    }
    if let Some(ref fields) = options.must_fuzzy_match {
        clauses.extend(Occur::Must, fuzzy_fragments(fields, fuzziness));
    }
    if let Some(ref fields) = options.should_fuzzy_match {
        clauses.extend(Occur::Should, fuzzy_fragments(fields, fuzziness));
    }
    if let Some(ref value) = options.must_all_match {
        clauses.extend(Occur::Must, catch_all_fragments(value));
    }
    if let Some(ref value) = options.should_all_match {
        clauses.extend(Occur::Should, catch_all_fragments(value));
    }
    if let Some(ref fields) = options.must_match {
        clauses.extend(Occur::Must, term_fragments(fields));
    }
    if let Some(ref fields) = options.should_match {
        clauses.extend(Occur::Should, term_fragments(fields));
    }
    if let Some(ref fields) = options.must_match_phrase {
        clauses.extend(Occur::Must, phrase_fragments(fields));
    }
    if let Some(ref fields) = options.must_array {
        clauses.extend(Occur::Must, array_fragments("mustArray", fields)?);
    }
    if let Some(ref fields) = options.should_array {
        clauses.extend(Occur::Should, array_fragments("shouldArray", fields)?);
    }
    if let Some(ref fields) = options.must_range {
        clauses.extend(Occur::Must, range_fragments("mustRange", fields));
    }
    if let Some(ref fields) = options.should_range {
        clauses.extend(Occur::Should, range_fragments("shouldRange", fields));
    }
    if options.match_all {
        clauses.extend(Occur::Must, [Fragment::MatchAll]);
    }

    Ok(clauses)
}

/// Builds a complete search request body.
///
/// Fails only when an array category receives a non-array value.
pub fn build_search_body(options: &SearchOptions) -> Result<Value, ConfigError> {
    let clauses = build_clauses(options)?;
    let (from, size) = paging(options.page, options.page_size);

    let mut body = json!({
        "query": { "bool": clauses.into_bool() },
        "from": from,
        "size": size,
    });

    if let Some(ref sort) = options.sort {
        body["sort"] = sort.clone();
    }

    Ok(body)
}
