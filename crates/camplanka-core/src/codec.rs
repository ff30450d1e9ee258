//! Document codec: remote field maps to typed entities and back.
//!
//! Decoding is schema-driven. Each entity names its required fields and the
//! defaults for optional ones; a document that lacks a required field is
//! skipped with a [`DecodeError`] instead of failing the whole snapshot.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::store::{Document, FieldValue, Fields};

/// Why a document was skipped during decode.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' should be a {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

/// An entity mirrored from a remote collection.
pub trait SyncEntity: Clone + Debug + Send + Sync + 'static {
    /// Stable identifier, unique within the collection scope.
    fn id(&self) -> &str;

    /// Build the entity from a document id and its fields.
    fn decode(id: &str, fields: &Fields) -> Result<Self, DecodeError>;

    /// Field map for writing the entity.
    fn encode(&self) -> Fields;

    /// Current value of a named boolean flag, if the entity has one.
    fn flag(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Set a named boolean flag. Returns `false` when the flag is unknown.
    fn set_flag(&mut self, _name: &str, _value: bool) -> bool {
        false
    }
}

/// Decode every document in a snapshot, skipping the ones that fail.
pub fn decode_batch<T: SyncEntity>(documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|document| match T::decode(&document.id, &document.fields) {
            Ok(entity) => Some(entity),
            Err(error) => {
                tracing::warn!(document = %document.id, "Skipping document: {}", error);
                None
            }
        })
        .collect()
}

/// Typed readers over a document's fields.
///
/// Optional readers are lenient: a missing or mistyped value yields the
/// default.
pub trait FieldsExt {
    fn required_str(&self, field: &'static str) -> Result<String, DecodeError>;
    fn opt_str(&self, field: &str) -> Option<String>;
    fn str_or(&self, field: &str, default: &str) -> String;
    fn bool_or(&self, field: &str, default: bool) -> bool;
    fn f64_or(&self, field: &str, default: f64) -> f64;
    fn i64_or(&self, field: &str, default: i64) -> i64;
    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>>;
    fn str_list(&self, field: &str) -> Vec<String>;
}

impl FieldsExt for Fields {
    fn required_str(&self, field: &'static str) -> Result<String, DecodeError> {
        match self.get(field) {
            Some(FieldValue::String(value)) => Ok(value.clone()),
            None | Some(FieldValue::Null) => Err(DecodeError::MissingField(field)),
            Some(other) => Err(DecodeError::WrongType {
                field,
                expected: "string",
                found: other.kind(),
            }),
        }
    }

    fn opt_str(&self, field: &str) -> Option<String> {
        match self.get(field) {
            Some(FieldValue::String(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn str_or(&self, field: &str, default: &str) -> String {
        self.opt_str(field).unwrap_or_else(|| default.to_string())
    }

    fn bool_or(&self, field: &str, default: bool) -> bool {
        match self.get(field) {
            Some(FieldValue::Boolean(value)) => *value,
            _ => default,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn f64_or(&self, field: &str, default: f64) -> f64 {
        match self.get(field) {
            Some(FieldValue::Double(value)) => *value,
            Some(FieldValue::Integer(value)) => *value as f64,
            _ => default,
        }
    }

    fn i64_or(&self, field: &str, default: i64) -> i64 {
        match self.get(field) {
            Some(FieldValue::Integer(value)) => *value,
            _ => default,
        }
    }

    fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        match self.get(field) {
            Some(FieldValue::Timestamp(value)) => Some(*value),
            _ => None,
        }
    }

    fn str_list(&self, field: &str) -> Vec<String> {
        match self.get(field) {
            Some(FieldValue::Array(values)) => values
                .iter()
                .filter_map(|value| match value {
                    FieldValue::String(text) => Some(text.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Site {
        id: String,
        name: String,
        rating: f64,
    }

    impl SyncEntity for Site {
        fn id(&self) -> &str {
            &self.id
        }

        fn decode(id: &str, fields: &Fields) -> Result<Self, DecodeError> {
            Ok(Self {
                id: id.to_string(),
                name: fields.required_str("name")?,
                rating: fields.f64_or("rating", 0.0),
            })
        }

        fn encode(&self) -> Fields {
            let mut fields = Fields::new();
            fields.insert("name".to_string(), self.name.clone().into());
            fields.insert("rating".to_string(), self.rating.into());
            fields
        }
    }

    fn document(id: &str, entries: &[(&str, FieldValue)]) -> Document {
        Document::new(
            id,
            entries
                .iter()
                .map(|(key, value)| ((*key).to_string(), value.clone()))
                .collect(),
        )
    }

    #[test]
    fn batch_skips_invalid_documents() {
        let documents = vec![
            document("a", &[("name", "Horton Plains".into())]),
            document("b", &[("rating", FieldValue::Double(4.0))]),
            document("c", &[("name", FieldValue::Integer(3))]),
            document("d", &[("name", "Wilpattu".into()), ("rating", 5_i64.into())]),
        ];

        let decoded: Vec<Site> = decode_batch(&documents);
        assert_eq!(
            decoded,
            vec![
                Site {
                    id: "a".to_string(),
                    name: "Horton Plains".to_string(),
                    rating: 0.0,
                },
                Site {
                    id: "d".to_string(),
                    name: "Wilpattu".to_string(),
                    rating: 5.0,
                },
            ]
        );
    }

    #[test]
    fn required_str_reports_reason() {
        let mut fields = Fields::new();
        assert_eq!(
            fields.required_str("name"),
            Err(DecodeError::MissingField("name"))
        );

        fields.insert("name".to_string(), FieldValue::Boolean(true));
        assert_eq!(
            fields.required_str("name"),
            Err(DecodeError::WrongType {
                field: "name",
                expected: "string",
                found: "boolean",
            })
        );
    }

    #[test]
    fn optional_readers_fall_back_on_wrong_types() {
        let mut fields = Fields::new();
        fields.insert("likes".to_string(), FieldValue::from("many"));
        fields.insert("isFavorite".to_string(), FieldValue::Integer(1));
        fields.insert(
            "participants".to_string(),
            FieldValue::Array(vec!["u1".into(), FieldValue::Integer(2), "u3".into()]),
        );

        assert_eq!(fields.i64_or("likes", 0), 0);
        assert!(!fields.bool_or("isFavorite", false));
        assert_eq!(fields.str_or("location", "unknown"), "unknown");
        assert_eq!(fields.timestamp("addedAt"), None);
        assert_eq!(fields.str_list("participants"), vec!["u1", "u3"]);
    }

    #[test]
    fn default_flag_accessors_are_inert() {
        let mut site = Site {
            id: "a".to_string(),
            name: "Yala".to_string(),
            rating: 4.5,
        };
        assert_eq!(site.flag("isFavorite"), None);
        assert!(!site.set_flag("isFavorite", true));
    }
}
