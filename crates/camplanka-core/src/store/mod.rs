//! Remote document store abstraction.
//!
//! The store is the system of record. Everything the sync layer needs from it
//! is captured by [`RemoteStore`]: point reads, writes and deletes, and live
//! collection subscriptions that deliver the full matching document set on
//! every change.

mod memory;
mod path;
mod value;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use memory::MemoryStore;
pub use path::{CollectionPath, DocumentPath};
pub use value::{resolve_fields, server_timestamp, FieldValue, Fields};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document as delivered in a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// One delivery from a live subscription.
pub type Snapshot = StoreResult<Vec<Document>>;

/// Sort direction for [`CollectionQuery::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A collection subscription: equality filters plus optional ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    pub collection: CollectionPath,
    pub filters: Vec<(String, FieldValue)>,
    pub order_by: Option<(String, Direction)>,
}

impl CollectionQuery {
    pub const fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    /// Whether a document at `path` with `fields` belongs to this query.
    pub fn matches(&self, path: &DocumentPath, fields: &Fields) -> bool {
        path.parent() == self.collection
            && self
                .filters
                .iter()
                .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Receiving end of a live collection subscription.
///
/// Dropping the stream unsubscribes: the store stops delivering once it sees
/// the channel closed.
#[derive(Debug)]
pub struct SnapshotStream {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
}

impl SnapshotStream {
    pub const fn new(receiver: mpsc::UnboundedReceiver<Snapshot>) -> Self {
        Self { receiver }
    }

    /// Wait for the next snapshot. `None` once the store has closed the stream.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Take a snapshot that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<Snapshot> {
        self.receiver.try_recv().ok()
    }
}

/// The remote document store collaborator.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read one document. `Ok(None)` when it does not exist.
    async fn get_document(&self, path: &DocumentPath) -> StoreResult<Option<Fields>>;

    /// Write a document, replacing it or merging into the existing fields.
    async fn set_document(&self, path: &DocumentPath, fields: Fields, merge: bool)
        -> StoreResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete_document(&self, path: &DocumentPath) -> StoreResult<()>;

    /// Subscribe to every change of the documents matching `query`.
    ///
    /// The first snapshot is the current state.
    async fn subscribe_collection(&self, query: CollectionQuery) -> StoreResult<SnapshotStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_matches_parent_and_filters() {
        let query = CollectionQuery::new(CollectionPath::root("plans")).where_eq("userId", "u1");

        let mut mine = Fields::new();
        mine.insert("userId".to_string(), FieldValue::from("u1"));
        let mut theirs = Fields::new();
        theirs.insert("userId".to_string(), FieldValue::from("u2"));

        let plan = CollectionPath::root("plans").doc("p1");
        assert!(query.matches(&plan, &mine));
        assert!(!query.matches(&plan, &theirs));
        assert!(!query.matches(&plan, &Fields::new()));

        let nested = plan.collection("chats").doc("m1");
        assert!(!query.matches(&nested, &mine));
    }
}
