//! Data models for CampLanka

mod chat;
mod plan;
mod wishlist;

pub use chat::ChatMessage;
pub use plan::Plan;
pub use wishlist::{WishlistItem, IS_FAVORITE};

/// A new client-side document id (UUID v7, time-sortable).
pub fn new_document_id() -> String {
    uuid::Uuid::now_v7().to_string()
}
