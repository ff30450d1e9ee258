//! Trip chat message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_document_id;
use crate::codec::{DecodeError, FieldsExt, SyncEntity};
use crate::store::{server_timestamp, FieldValue, Fields};

/// A message in a trip plan's chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    /// Server-assigned; `None` until the message has been written
    pub sent_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// A new, unsent message with a fresh id.
    pub fn new(
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: new_document_id(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            text: text.into(),
            sent_at: None,
        }
    }

    /// Whether the message was sent by `user_id`.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }
}

impl SyncEntity for ChatMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn decode(id: &str, fields: &Fields) -> Result<Self, DecodeError> {
        Ok(Self {
            id: id.to_string(),
            sender_id: fields.required_str("senderId")?,
            sender_name: fields.str_or("senderName", ""),
            text: fields.required_str("text")?,
            sent_at: fields.timestamp("timestamp"),
        })
    }

    fn encode(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("senderId".to_string(), self.sender_id.clone().into());
        fields.insert("senderName".to_string(), self.sender_name.clone().into());
        fields.insert("text".to_string(), self.text.clone().into());
        fields.insert(
            "timestamp".to_string(),
            self.sent_at
                .map_or_else(server_timestamp, FieldValue::Timestamp),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_encodes_server_timestamp() {
        let message = ChatMessage::new("u1", "Nimal", "See you at the trailhead");
        let fields = message.encode();
        assert_eq!(fields.get("timestamp"), Some(&FieldValue::ServerTimestamp));
        assert!(message.is_from("u1"));
        assert!(!message.is_from("u2"));
    }

    #[test]
    fn decode_requires_sender_and_text() {
        let mut fields = Fields::new();
        fields.insert("text".to_string(), "hi".into());
        assert_eq!(
            ChatMessage::decode("m1", &fields),
            Err(DecodeError::MissingField("senderId"))
        );

        fields.insert("senderId".to_string(), "u1".into());
        let message = ChatMessage::decode("m1", &fields).unwrap();
        assert_eq!(message.sender_name, "");
        assert_eq!(message.sent_at, None);
    }

    #[test]
    fn message_ids_are_unique() {
        let first = ChatMessage::new("u1", "A", "one");
        let second = ChatMessage::new("u1", "A", "two");
        assert_ne!(first.id, second.id);
    }
}
