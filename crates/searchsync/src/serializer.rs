//! Conversion of domain documents into engine-safe JSON.
//!
//! Documents are modelled as [`DocValue`], a tagged union of the shapes a
//! document store hands over: arrays, mappings, identifiers, dates and plain
//! scalars. [`serialize`] walks the value and produces a fresh JSON tree in
//! which identifiers are hex strings and dates are ISO-8601 strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Suffix appended to the grouper value when flattening sub-documents.
pub const FLATTEN_SUFFIX: &str = "_flat";

/// A 12-byte document identifier, rendered as 24 lowercase hex digits.
pub use bson::oid::ObjectId;

/// A document value as handed over by the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    /// Ordered sequence.
    Array(Vec<DocValue>),
    /// Field mapping.
    Object(BTreeMap<String, DocValue>),
    /// Identifier.
    Id(ObjectId),
    /// Timestamp.
    Date(DateTime<Utc>),
    /// Null, boolean, number or string.
    Scalar(Value),
}

impl DocValue {
    /// Builds an object from `(field, value)` pairs.
    pub fn object<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<DocValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        DocValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Looks up a field of an object.
    pub fn get(&self, field: &str) -> Option<&DocValue> {
        match self {
            DocValue::Object(map) => map.get(field),
            _ => None,
        }
    }
}

impl From<Value> for DocValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => DocValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                DocValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            scalar => DocValue::Scalar(scalar),
        }
    }
}

impl From<ObjectId> for DocValue {
    fn from(id: ObjectId) -> Self {
        DocValue::Id(id)
    }
}

impl From<DateTime<Utc>> for DocValue {
    fn from(date: DateTime<Utc>) -> Self {
        DocValue::Date(date)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        DocValue::Scalar(Value::String(s.to_string()))
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        DocValue::Scalar(Value::String(s))
    }
}

impl From<i64> for DocValue {
    fn from(n: i64) -> Self {
        DocValue::Scalar(Value::from(n))
    }
}

impl From<f64> for DocValue {
    fn from(n: f64) -> Self {
        DocValue::Scalar(Value::from(n))
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        DocValue::Scalar(Value::Bool(b))
    }
}

impl From<Vec<DocValue>> for DocValue {
    fn from(items: Vec<DocValue>) -> Self {
        DocValue::Array(items)
    }
}

/// Options for [`serialize_model`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeOptions {
    /// Field holding the sub-documents to flatten.
    #[serde(default)]
    pub flatten: Option<String>,
    /// Field inside each sub-document naming its group.
    #[serde(default)]
    pub grouper: Option<String>,
}

/// Converts a document value into engine-safe JSON.
pub fn serialize(value: &DocValue) -> Value {
    match value {
        DocValue::Array(items) => Value::Array(items.iter().map(serialize).collect()),
        DocValue::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serialize(v)))
                .collect(),
        ),
        DocValue::Id(id) => Value::String(id.to_hex()),
        DocValue::Date(date) => Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        DocValue::Scalar(scalar) => scalar.clone(),
    }
}

/// Serializes a whole document, flattening sub-documents when both
/// `flatten` and `grouper` are configured.
///
/// `{"stats": [{"kind": "weight", "value": 4}]}` with `flatten = "stats"` and
/// `grouper = "kind"` becomes `{"stats": {"weight_flat": {"kind": "weight", "value": 4}}}`.
pub fn serialize_model(document: &DocValue, options: &SerializeOptions) -> Value {
    let mut serialized = serialize(document);

    if let (Some(flatten), Some(grouper)) = (options.flatten.as_deref(), options.grouper.as_deref())
    {
        if let Some(target) = serialized.get_mut(flatten) {
            if let Some(flattened) = flatten_by(target, grouper) {
                *target = flattened;
            }
        }
    }

    serialized
}

/// Re-keys an array of objects by `<grouper value><FLATTEN_SUFFIX>`.
///
/// Returns `None` when the target is not an array; entries without a usable
/// grouper value are dropped.
fn flatten_by(target: &Value, grouper: &str) -> Option<Value> {
    let items = target.as_array()?;
    let mut flattened = Map::new();

    for item in items {
        let group = match item.get(grouper) {
            Some(Value::String(s)) => s.clone(),
            Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
            _ => {
                debug!(grouper = grouper, "Dropping sub-document without a group value");
                continue;
            }
        };
        flattened.insert(format!("{}{}", group, FLATTEN_SUFFIX), item.clone());
    }

    Some(Value::Object(flattened))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const ID: &str = "507f1f77bcf86cd799439011";
    const ID2: &str = "507f191e810c19729de860ea";

    #[test]
    fn test_object_id_parse_and_format() {
        let id = ObjectId::parse_str(ID).unwrap();
        assert_eq!(id.to_hex(), ID);
        assert_eq!(id.to_string(), ID);
        assert_eq!(ObjectId::parse_str(ID.to_uppercase()).unwrap(), id);
        assert_eq!(ObjectId::from_bytes(id.bytes()), id);
        assert!(ObjectId::parse_str("xyz").is_err());
        assert!(ObjectId::parse_str("zz7f1f77bcf86cd799439011").is_err());
        // Sign characters are not hex digits.
        assert!(ObjectId::parse_str("+f+f+f+f+f+f+f+f+f+f+f+f").is_err());
        assert!(ObjectId::parse_str("-f-f-f-f-f-f-f-f-f-f-f-f").is_err());
    }

    #[test]
    fn test_serialize_ids_and_dates_recursively() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let doc = DocValue::object([
            ("_id", DocValue::Id(ObjectId::parse_str(ID).unwrap())),
            ("createdAt", DocValue::Date(created)),
            (
                "nested",
                DocValue::object([("_id", DocValue::Id(ObjectId::parse_str(ID2).unwrap()))]),
            ),
        ]);

        assert_eq!(
            serialize(&doc),
            json!({
                "_id": ID,
                "createdAt": "2024-03-01T12:30:00.000Z",
                "nested": { "_id": ID2 }
            })
        );
    }

    #[test]
    fn test_serialize_arrays_and_scalars() {
        let doc = DocValue::Array(vec![
            DocValue::from("tabby"),
            DocValue::from(3i64),
            DocValue::from(true),
            DocValue::Scalar(Value::Null),
            DocValue::Id(ObjectId::parse_str(ID).unwrap()),
        ]);
        assert_eq!(serialize(&doc), json!(["tabby", 3, true, null, ID]));
    }

    #[test]
    fn test_serialize_leaves_input_untouched() {
        let doc = DocValue::object([("_id", DocValue::Id(ObjectId::parse_str(ID).unwrap()))]);
        let before = doc.clone();
        let _ = serialize(&doc);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_from_json() {
        let doc = DocValue::from(json!({ "name": "Felix", "tags": ["a"] }));
        assert_eq!(doc.get("name"), Some(&DocValue::from("Felix")));
        assert_eq!(serialize(&doc), json!({ "name": "Felix", "tags": ["a"] }));
    }

    #[test]
    fn test_serialize_model_flattens() {
        let doc = DocValue::from(json!({
            "name": "Felix",
            "stats": [
                { "kind": "weight", "value": 4 },
                { "kind": "height", "value": 30 },
                { "value": 1 }
            ]
        }));
        let options = SerializeOptions {
            flatten: Some("stats".to_string()),
            grouper: Some("kind".to_string()),
        };

        assert_eq!(
            serialize_model(&doc, &options),
            json!({
                "name": "Felix",
                "stats": {
                    "weight_flat": { "kind": "weight", "value": 4 },
                    "height_flat": { "kind": "height", "value": 30 }
                }
            })
        );
    }

    #[test]
    fn test_serialize_model_needs_both_options() {
        let doc = DocValue::from(json!({ "stats": [{ "kind": "weight" }] }));
        let options = SerializeOptions {
            flatten: Some("stats".to_string()),
            grouper: None,
        };
        assert_eq!(serialize_model(&doc, &options), serialize(&doc));
    }

    #[test]
    fn test_serialize_model_ignores_non_array_target() {
        let doc = DocValue::from(json!({ "stats": "n/a" }));
        let options = SerializeOptions {
            flatten: Some("stats".to_string()),
            grouper: Some("kind".to_string()),
        };
        assert_eq!(serialize_model(&doc, &options), json!({ "stats": "n/a" }));
    }
}
