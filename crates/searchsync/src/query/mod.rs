//! Search query translation.
//!
//! Translates option sets into search engine query DSL. Everything in this
//! module is pure: no I/O, and the same input always yields the same body.

pub mod aggregation;
pub mod builder;
pub mod fragments;
pub mod options;

pub use aggregation::build_agg_body;
pub use builder::{ClauseSet, Occur, build_search_body};
pub use fragments::Fragment;
pub use options::{AggregationOptions, FieldValues, SearchOptions};
