//! Trip plan model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_document_id;
use crate::codec::{DecodeError, FieldsExt, SyncEntity};
use crate::store::{server_timestamp, FieldValue, Fields};

/// A camping trip plan owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    /// Owner of the plan
    pub user_id: String,
    pub name: String,
    pub campground_name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// User ids invited to the trip
    pub participants: Vec<String>,
    pub notes: String,
    /// Server-assigned when the plan is first saved
    pub date_created: Option<DateTime<Utc>>,
}

impl Plan {
    /// A new, unsaved plan with a fresh id.
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: new_document_id(),
            user_id: user_id.into(),
            name: name.into(),
            campground_name: String::new(),
            start_date: None,
            end_date: None,
            participants: Vec::new(),
            notes: String::new(),
            date_created: None,
        }
    }

    #[must_use]
    pub fn with_campground(mut self, campground_name: impl Into<String>) -> Self {
        self.campground_name = campground_name.into();
        self
    }

    #[must_use]
    pub const fn with_dates(
        mut self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    #[must_use]
    pub fn with_participants(mut self, participants: Vec<String>) -> Self {
        self.participants = participants;
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Trip length in days, when both dates are set and ordered.
    pub fn duration_days(&self) -> Option<i64> {
        let (start, end) = (self.start_date?, self.end_date?);
        (end >= start).then(|| (end - start).num_days() + 1)
    }
}

impl SyncEntity for Plan {
    fn id(&self) -> &str {
        &self.id
    }

    fn decode(id: &str, fields: &Fields) -> Result<Self, DecodeError> {
        Ok(Self {
            id: id.to_string(),
            user_id: fields.required_str("userId")?,
            name: fields.required_str("name")?,
            campground_name: fields.str_or("campgroundName", ""),
            start_date: fields.timestamp("startDate"),
            end_date: fields.timestamp("endDate"),
            participants: fields.str_list("participants"),
            notes: fields.str_or("notes", ""),
            date_created: fields.timestamp("dateCreated"),
        })
    }

    fn encode(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("userId".to_string(), self.user_id.clone().into());
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert(
            "campgroundName".to_string(),
            self.campground_name.clone().into(),
        );
        fields.insert("startDate".to_string(), self.start_date.into());
        fields.insert("endDate".to_string(), self.end_date.into());
        fields.insert(
            "participants".to_string(),
            self.participants.clone().into(),
        );
        fields.insert("notes".to_string(), self.notes.clone().into());
        fields.insert(
            "dateCreated".to_string(),
            self.date_created
                .map_or_else(server_timestamp, FieldValue::Timestamp),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_requires_owner_and_name() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), "Weekend at Ella".into());
        assert_eq!(
            Plan::decode("p1", &fields),
            Err(DecodeError::MissingField("userId"))
        );
    }

    #[test]
    fn decode_reads_null_dates_as_unset() {
        let plan = Plan::new("u1", "Horton Plains").with_campground("Pattipola");
        let decoded = Plan::decode(&plan.id, &plan.encode()).unwrap();
        assert_eq!(decoded.start_date, None);
        assert_eq!(decoded.campground_name, "Pattipola");
        assert_eq!(decoded.user_id, "u1");
    }

    #[test]
    fn duration_counts_both_ends() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();

        let plan = Plan::new("u1", "Trip").with_dates(Some(start), Some(end));
        assert_eq!(plan.duration_days(), Some(3));

        let reversed = Plan::new("u1", "Trip").with_dates(Some(end), Some(start));
        assert_eq!(reversed.duration_days(), None);
        assert_eq!(Plan::new("u1", "Trip").duration_days(), None);
    }

    #[test]
    fn participants_round_trip() {
        let plan = Plan::new("u1", "Trip")
            .with_participants(vec!["u2".to_string(), "u3".to_string()])
            .with_notes("Bring rain gear");
        let decoded = Plan::decode(&plan.id, &plan.encode()).unwrap();
        assert_eq!(decoded.participants, vec!["u2", "u3"]);
        assert_eq!(decoded.notes, "Bring rain gear");
    }
}
