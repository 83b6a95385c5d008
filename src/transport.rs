//! The seam between the object mapper and the network.
//!
//! Entities never talk HTTP directly. They call a [`Transport`] with a
//! controller path (`/Tickets/Ticket`), positional parameters and, for
//! mutations, an ordered [`RequestData`] payload. [`crate::RestClient`] is
//! the production implementation; tests substitute scripted doubles.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;

/// Decoded response data (see `crate::xml` for the shape).
pub type WireData = Value;

/// A decoded node.
pub type WireMap = serde_json::Map<String, Value>;

/// A single form field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Sent as `name=value`.
    Scalar(String),
    /// Sent as repeated `name[]=value`.
    List(Vec<String>),
}

/// Ordered request payload built by entities.
///
/// `put_*` methods skip `None` so optional fields are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestData {
    fields: IndexMap<String, FieldValue>,
}

impl RequestData {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a text field when present.
    pub fn put_str(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.fields
                .insert(name.to_string(), FieldValue::Scalar(value.to_string()));
        }
        self
    }

    /// Sets an unsigned integer field when present.
    pub fn put_u64(&mut self, name: &str, value: Option<u64>) -> &mut Self {
        if let Some(value) = value {
            self.fields
                .insert(name.to_string(), FieldValue::Scalar(value.to_string()));
        }
        self
    }

    /// Sets a signed integer field when present.
    pub fn put_i64(&mut self, name: &str, value: Option<i64>) -> &mut Self {
        if let Some(value) = value {
            self.fields
                .insert(name.to_string(), FieldValue::Scalar(value.to_string()));
        }
        self
    }

    /// Sets a boolean field as `1`/`0` when present.
    pub fn put_bool(&mut self, name: &str, value: Option<bool>) -> &mut Self {
        if let Some(value) = value {
            let wire = if value { "1" } else { "0" };
            self.fields
                .insert(name.to_string(), FieldValue::Scalar(wire.to_string()));
        }
        self
    }

    /// Sets a list field; the field is sent even when the list is empty.
    pub fn put_list<I, S>(&mut self, name: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.fields.insert(name.to_string(), FieldValue::List(values));
        self
    }

    /// Appends every field of `other`, replacing fields with the same name.
    pub fn merge(&mut self, other: RequestData) -> &mut Self {
        self.fields.extend(other.fields);
        self
    }

    /// Returns a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns a scalar field's text.
    #[must_use]
    pub fn scalar(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(FieldValue::Scalar(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns true when the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flattens into form pairs, expanding lists to `name[]`.
    #[must_use]
    pub fn to_form_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            match value {
                FieldValue::Scalar(s) => pairs.push((name.clone(), s.clone())),
                FieldValue::List(items) => {
                    let key = format!("{}[]", name);
                    pairs.extend(items.iter().map(|item| (key.clone(), item.clone())));
                }
            }
        }
        pairs
    }
}

/// A file sent as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name reported to the server.
    pub file_name: String,
    /// Raw bytes.
    pub contents: Vec<u8>,
}

/// REST transport used by every entity operation.
///
/// Implementations must be shareable across tasks; the client handle keeps
/// one behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET controller/params...`
    async fn get(&self, controller: &str, params: &[String]) -> Result<WireData>;

    /// `POST controller/params...` with form fields and optional files.
    async fn post(
        &self,
        controller: &str,
        params: &[String],
        fields: &RequestData,
        files: &[FilePart],
    ) -> Result<WireData>;

    /// `PUT controller/params...` with form fields.
    async fn put(&self, controller: &str, params: &[String], fields: &RequestData)
        -> Result<WireData>;

    /// `DELETE controller/params...`
    async fn delete(&self, controller: &str, params: &[String]) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put_skips_none() {
        let mut data = RequestData::new();
        data.put_str("title", Some("Agents"))
            .put_str("missing", None)
            .put_u64("id", None)
            .put_bool("isadmin", Some(false));

        assert_eq!(data.len(), 2);
        assert_eq!(data.scalar("title"), Some("Agents"));
        assert_eq!(data.scalar("isadmin"), Some("0"));
        assert!(!data.contains("missing"));
    }

    #[test]
    fn test_form_pairs_expand_lists() {
        let mut data = RequestData::new();
        data.put_str("title", Some("General"))
            .put_list("usergroupid", [1u64, 3]);

        assert_eq!(
            data.to_form_pairs(),
            vec![
                ("title".to_string(), "General".to_string()),
                ("usergroupid[]".to_string(), "1".to_string()),
                ("usergroupid[]".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut first = RequestData::new();
        first.put_str("a", Some("1"));
        let mut second = RequestData::new();
        second.put_str("b", Some("2"));
        first.merge(second);

        let names: Vec<&str> = first.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
