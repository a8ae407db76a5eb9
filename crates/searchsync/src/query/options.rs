//! Option sets accepted by the query and aggregation builders.
//!
//! Option sets deserialize from the camelCase JSON shape callers already use
//! (`{"mustMatch": {"breed": "siamese"}, "pageSize": 25}`), and every category
//! is optional. Field-keyed categories keep the caller's insertion order, and
//! clauses are generated in that order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name to clause value(s), in insertion order. Array values explode
/// into one clause per element unless the category says otherwise.
pub type FieldValues = Map<String, Value>;

/// Page size used when an option set does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Fuzziness used by fuzzy categories when the option set does not specify one.
pub const DEFAULT_FUZZINESS: &str = "AUTO";

/// Options for a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Exact (case-folded) term filters that must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_match: Option<FieldValues>,

    /// Exact (case-folded) term filters that should match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_match: Option<FieldValues>,

    /// Phrases that must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_match_phrase: Option<FieldValues>,

    /// Fuzzy matches that must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_fuzzy_match: Option<FieldValues>,

    /// Fuzzy matches that should match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_fuzzy_match: Option<FieldValues>,

    /// Values that must not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_not_match: Option<FieldValues>,

    /// Values that should not match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_not_match: Option<FieldValues>,

    /// Text matched against the catch-all field; string or array of strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_all_match: Option<Value>,

    /// Text matched against the catch-all field; string or array of strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_all_match: Option<Value>,

    /// Range expressions (`{"gte": .., "lt": ..}`) that must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_range: Option<FieldValues>,

    /// Range expressions that should match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_range: Option<FieldValues>,

    /// Array membership that must match; values must be arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_array: Option<FieldValues>,

    /// Array membership that should match; values must be arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_array: Option<FieldValues>,

    /// Adds a `match_all` clause.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub match_all: bool,

    /// Engine sort specification, copied verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,

    /// Fuzziness shared by the fuzzy categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<Value>,

    /// Page length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,

    /// 1-based page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

fn insert(slot: &mut Option<FieldValues>, field: impl Into<String>, value: impl Into<Value>) {
    slot.get_or_insert_with(Map::new)
        .insert(field.into(), value.into());
}

impl SearchOptions {
    /// Creates an empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `mustMatch` entry.
    pub fn with_must_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        insert(&mut self.must_match, field, value);
        self
    }

    /// Adds a `shouldMatch` entry.
    pub fn with_should_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        insert(&mut self.should_match, field, value);
        self
    }

    /// Adds a `mustMatchPhrase` entry.
    pub fn with_must_match_phrase(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        insert(&mut self.must_match_phrase, field, value);
        self
    }

    /// Adds a `mustFuzzyMatch` entry.
    pub fn with_must_fuzzy_match(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        insert(&mut self.must_fuzzy_match, field, value);
        self
    }

    /// Adds a `shouldFuzzyMatch` entry.
    pub fn with_should_fuzzy_match(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        insert(&mut self.should_fuzzy_match, field, value);
        self
    }

    /// Adds a `mustNotMatch` entry.
    pub fn with_must_not_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        insert(&mut self.must_not_match, field, value);
        self
    }

    /// Adds a `shouldNotMatch` entry.
    pub fn with_should_not_match(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        insert(&mut self.should_not_match, field, value);
        self
    }

    /// Adds a `mustRange` entry.
    pub fn with_must_range(mut self, field: impl Into<String>, range: impl Into<Value>) -> Self {
        insert(&mut self.must_range, field, range);
        self
    }

    /// Adds a `shouldRange` entry.
    pub fn with_should_range(mut self, field: impl Into<String>, range: impl Into<Value>) -> Self {
        insert(&mut self.should_range, field, range);
        self
    }

    /// Adds a `mustArray` entry.
    pub fn with_must_array(mut self, field: impl Into<String>, values: impl Into<Value>) -> Self {
        insert(&mut self.must_array, field, values);
        self
    }

    /// Adds a `shouldArray` entry.
    pub fn with_should_array(mut self, field: impl Into<String>, values: impl Into<Value>) -> Self {
        insert(&mut self.should_array, field, values);
        self
    }

    /// Sets the sort specification.
    pub fn with_sort(mut self, sort: Value) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the fuzziness for fuzzy categories.
    pub fn with_fuzziness(mut self, fuzziness: impl Into<Value>) -> Self {
        self.fuzziness = Some(fuzziness.into());
        self
    }

    /// Sets the 1-based page and the page length.
    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

/// Options for a grouping (terms aggregation) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationOptions {
    /// Field whose values form the buckets.
    pub group_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_match: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_match: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_fuzzy_match: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_fuzzy_match: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub must_range: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_range: Option<FieldValues>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

impl AggregationOptions {
    /// Creates options grouping by `group_by` with no filters.
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            must_match: None,
            should_match: None,
            must_fuzzy_match: None,
            should_fuzzy_match: None,
            must_range: None,
            should_range: None,
            fuzziness: None,
            page_size: None,
            page: None,
        }
    }

    /// Adds a `mustMatch` entry.
    pub fn with_must_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        insert(&mut self.must_match, field, value);
        self
    }

    /// Adds a `shouldMatch` entry.
    pub fn with_should_match(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        insert(&mut self.should_match, field, value);
        self
    }

    /// Adds a `mustRange` entry.
    pub fn with_must_range(mut self, field: impl Into<String>, range: impl Into<Value>) -> Self {
        insert(&mut self.must_range, field, range);
        self
    }

    /// Sets the 1-based page and the page length.
    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

/// Computes `(from, size)` for a 1-based page.
pub fn paging(page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
    let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    let from = page
        .map(|p| p.saturating_sub(1).saturating_mul(size))
        .unwrap_or(0);
    (from, size)
}
