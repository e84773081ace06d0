use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Store-assigned document identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document as returned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// A numeric field as an unsigned integer, if present and integral.
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        let value = self.fields.get(field)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        })
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Decode the fields into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::Serialization(format!("document {}: {e}", self.id)))
    }

    /// Encode a typed record into a field map.
    pub fn encode<T: Serialize>(record: &T) -> StoreResult<Fields> {
        match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Serialization(format!(
                "expected an object, got {other}"
            ))),
        }
    }
}

/// A list query: exact-match filters, optional descending sort on a numeric
/// field, optional limit, optional projection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_desc: Option<String>,
    pub limit: Option<usize>,
    pub select: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only documents whose `field` equals `value` exactly.
    pub fn equal(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Sort descending by a numeric field. Documents without it sort last.
    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order_desc = Some(field.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Return only these fields of each document.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field).is_some_and(|v| values_equal(v, expected)))
    }

    /// Apply projection to a matching document.
    pub fn project(&self, doc: &Document) -> Document {
        match &self.select {
            None => doc.clone(),
            Some(fields) => {
                let projected = fields
                    .iter()
                    .filter_map(|f| doc.fields.get(f).map(|v| (f.clone(), v.clone())))
                    .collect();
                Document::new(doc.id.clone(), projected)
            }
        }
    }
}

/// Exact-match equality, treating `10001` and `10001.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Opaque reference to an uploaded blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Value) -> Document {
        Document::new(DocumentId::new("d1"), fields.as_object().unwrap().clone())
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let d = doc(json!({"receiptId": 10001.0}));
        assert!(Query::new().equal("receiptId", 10001u64).matches(&d));
        assert!(!Query::new().equal("receiptId", 10002u64).matches(&d));
    }

    #[test]
    fn string_filters_are_exact() {
        let d = doc(json!({"displayTransactionId": "ACF-10001"}));
        assert!(Query::new().equal("displayTransactionId", "ACF-10001").matches(&d));
        assert!(!Query::new().equal("displayTransactionId", "acf-10001").matches(&d));
        assert!(!Query::new().equal("missing", "ACF-10001").matches(&d));
    }

    #[test]
    fn projection_keeps_selected_fields_only() {
        let d = doc(json!({"receiptId": 1, "donorName": "Jane"}));
        let p = Query::new().select(["receiptId"]).project(&d);
        assert_eq!(p.fields.len(), 1);
        assert_eq!(p.get_u64("receiptId"), Some(1));
        assert_eq!(p.id, d.id);
    }

    #[test]
    fn get_u64_accepts_integral_floats_only() {
        let d = doc(json!({"a": 5, "b": 5.0, "c": 5.5, "d": -1, "e": "5"}));
        assert_eq!(d.get_u64("a"), Some(5));
        assert_eq!(d.get_u64("b"), Some(5));
        assert_eq!(d.get_u64("c"), None);
        assert_eq!(d.get_u64("d"), None);
        assert_eq!(d.get_u64("e"), None);
    }

    #[test]
    fn encode_rejects_non_objects() {
        assert!(Document::encode(&5).is_err());
        let fields = Document::encode(&json!({"x": 1})).unwrap();
        assert_eq!(fields["x"], 1);
    }
}
