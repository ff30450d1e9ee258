//! Wishlist item model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{DecodeError, FieldsExt, SyncEntity};
use crate::store::{server_timestamp, FieldValue, Fields};

/// Name of the favorite flag on wishlist documents.
pub const IS_FAVORITE: &str = "isFavorite";

/// A campground saved to a user's wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// Campground id, also the wishlist document id
    pub id: String,
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
    /// Average rating, 0.0 when unrated
    pub rating: f64,
    pub likes: i64,
    pub is_favorite: bool,
    /// Server-assigned when the item is saved
    pub added_at: Option<DateTime<Utc>>,
}

impl WishlistItem {
    /// A campground summary that is not yet a favorite.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: String::new(),
            image_url: None,
            rating: 0.0,
            likes: 0,
            is_favorite: false,
            added_at: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }
}

impl SyncEntity for WishlistItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn decode(id: &str, fields: &Fields) -> Result<Self, DecodeError> {
        Ok(Self {
            id: id.to_string(),
            name: fields.required_str("name")?,
            location: fields.str_or("location", ""),
            image_url: fields.opt_str("imageUrl"),
            rating: fields.f64_or("rating", 0.0),
            likes: fields.i64_or("likes", 0),
            is_favorite: fields.bool_or(IS_FAVORITE, false),
            added_at: fields.timestamp("addedAt"),
        })
    }

    fn encode(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone().into());
        fields.insert("location".to_string(), self.location.clone().into());
        if let Some(image_url) = &self.image_url {
            fields.insert("imageUrl".to_string(), image_url.clone().into());
        }
        fields.insert("rating".to_string(), self.rating.into());
        fields.insert("likes".to_string(), self.likes.into());
        fields.insert(IS_FAVORITE.to_string(), self.is_favorite.into());
        fields.insert(
            "addedAt".to_string(),
            self.added_at
                .map_or_else(server_timestamp, FieldValue::Timestamp),
        );
        fields
    }

    fn flag(&self, name: &str) -> Option<bool> {
        (name == IS_FAVORITE).then_some(self.is_favorite)
    }

    fn set_flag(&mut self, name: &str, value: bool) -> bool {
        if name == IS_FAVORITE {
            self.is_favorite = value;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_applies_defaults() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), "Riverston".into());

        let item = WishlistItem::decode("site-1", &fields).unwrap();
        assert_eq!(item, WishlistItem::new("site-1", "Riverston"));
    }

    #[test]
    fn decode_requires_name() {
        let mut fields = Fields::new();
        fields.insert("rating".to_string(), 4.5.into());
        assert_eq!(
            WishlistItem::decode("site-1", &fields),
            Err(DecodeError::MissingField("name"))
        );
    }

    #[test]
    fn decode_reads_integer_rating() {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), "Knuckles".into());
        fields.insert("rating".to_string(), FieldValue::Integer(4));
        fields.insert("likes".to_string(), FieldValue::Integer(12));
        fields.insert(IS_FAVORITE.to_string(), true.into());

        let item = WishlistItem::decode("site-2", &fields).unwrap();
        assert!((item.rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(item.likes, 12);
        assert!(item.is_favorite);
    }

    #[test]
    fn encode_then_decode_preserves_item() {
        let item = WishlistItem::new("site-3", "Ella Rock")
            .with_location("Ella")
            .with_rating(4.8);
        let decoded = WishlistItem::decode("site-3", &item.encode()).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn unsaved_item_encodes_server_timestamp() {
        let item = WishlistItem::new("site-5", "Horton Plains");
        assert_eq!(
            item.encode().get("addedAt"),
            Some(&FieldValue::ServerTimestamp)
        );

        let added_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let saved = WishlistItem {
            added_at: Some(added_at),
            ..item
        };
        assert_eq!(
            saved.encode().get("addedAt"),
            Some(&FieldValue::Timestamp(added_at))
        );
    }

    #[test]
    fn only_is_favorite_is_a_flag() {
        let mut item = WishlistItem::new("site-4", "Yala");
        assert_eq!(item.flag(IS_FAVORITE), Some(false));
        assert!(item.set_flag(IS_FAVORITE, true));
        assert!(item.is_favorite);
        assert_eq!(item.flag("visited"), None);
        assert!(!item.set_flag("visited", true));
    }
}
