//! Loosely-typed document field values

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The field map of a remote document.
pub type Fields = BTreeMap<String, FieldValue>;

/// A single document field value.
///
/// `ServerTimestamp` is a write-only sentinel: the store replaces it with the
/// time the write is applied, so it never appears in documents read back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<FieldValue>),
    Map(Fields),
    ServerTimestamp,
}

impl FieldValue {
    /// Short type name used in decode errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::ServerTimestamp => "server timestamp",
        }
    }

    /// Replace every `ServerTimestamp` sentinel (including nested ones) with `now`.
    #[must_use]
    pub fn resolve_server_timestamps(self, now: DateTime<Utc>) -> Self {
        match self {
            Self::ServerTimestamp => Self::Timestamp(now),
            Self::Array(values) => Self::Array(
                values
                    .into_iter()
                    .map(|value| value.resolve_server_timestamps(now))
                    .collect(),
            ),
            Self::Map(fields) => Self::Map(resolve_fields(fields, now)),
            other => other,
        }
    }

    /// Ordering used by store queries.
    ///
    /// Values of different kinds sort by kind; numbers compare across
    /// integer/double.
    pub fn query_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => a.rank().cmp(&b.rank()),
            },
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Boolean(_) => 1,
            Self::Integer(_) | Self::Double(_) => 2,
            Self::Timestamp(_) | Self::ServerTimestamp => 3,
            Self::String(_) => 4,
            Self::Array(_) => 5,
            Self::Map(_) => 6,
        }
    }
}

/// Resolve server timestamps in every field of a write.
pub fn resolve_fields(fields: Fields, now: DateTime<Utc>) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key, value.resolve_server_timestamps(now)))
        .collect()
}

/// The server-assigned timestamp sentinel for writes.
pub const fn server_timestamp() -> FieldValue {
    FieldValue::ServerTimestamp
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_nested_server_timestamps() {
        let now = Utc::now();
        let mut nested = Fields::new();
        nested.insert("at".to_string(), server_timestamp());
        let value = FieldValue::Array(vec![server_timestamp(), FieldValue::Map(nested)]);

        let mut expected_nested = Fields::new();
        expected_nested.insert("at".to_string(), FieldValue::Timestamp(now));
        assert_eq!(
            value.resolve_server_timestamps(now),
            FieldValue::Array(vec![
                FieldValue::Timestamp(now),
                FieldValue::Map(expected_nested)
            ])
        );
    }

    #[test]
    fn query_cmp_mixes_integer_and_double() {
        assert_eq!(
            FieldValue::Integer(2).query_cmp(&FieldValue::Double(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            FieldValue::Null.query_cmp(&FieldValue::from("a")),
            Ordering::Less
        );
    }

    #[test]
    fn serializes_with_type_tags() {
        let json = serde_json::to_string(&FieldValue::from("Ella")).unwrap();
        assert_eq!(json, r#"{"type":"string","value":"Ella"}"#);

        let parsed: FieldValue = serde_json::from_str(r#"{"type":"null"}"#).unwrap();
        assert_eq!(parsed, FieldValue::Null);
    }
}
