//! Optimistic synchronization between remote collections and local state.
//!
//! [`RemoteSyncController`] mirrors one remote collection, selected by an
//! [`OwnerScope`], and mediates mutations. What collection a scope maps to and
//! how mutations are written is supplied by a [`SyncTarget`]; the four call
//! sites live in [`targets`] and [`FavoriteFlag`].

mod controller;
mod favorite;
pub mod targets;


use std::fmt;

use thiserror::Error;

use crate::codec::SyncEntity;
use crate::store::{CollectionQuery, DocumentPath, Fields, RemoteStore, StoreError, StoreResult};

pub use controller::{RemoteSyncController, SyncView};
pub use favorite::{FavoriteFlag, FavoriteView};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Please sign in to continue.")]
    SessionRequired,
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(#[from] StoreError),
    #[error("A change to '{0}' is already in progress")]
    MutationInFlight(String),
    #[error("Sync is not active")]
    Inactive,
    #[error("Sync controller has shut down")]
    Closed,
}

/// Identifier that selects the visible remote collection (a user id or a plan id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerScope(String);

impl OwnerScope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerScope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OwnerScope {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where a controller's scope comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSource {
    /// The signed-in user's id; the controller starts on its own.
    Session,
    /// Set through `start`, e.g. a plan id.
    Explicit,
}

/// A single remote write issued on behalf of a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteWrite {
    Set {
        path: DocumentPath,
        fields: Fields,
        merge: bool,
    },
    Delete {
        path: DocumentPath,
    },
}

impl RemoteWrite {
    pub async fn apply(self, store: &dyn RemoteStore) -> StoreResult<()> {
        match self {
            Self::Set {
                path,
                fields,
                merge,
            } => store.set_document(&path, fields, merge).await,
            Self::Delete { path } => store.delete_document(&path).await,
        }
    }
}

/// Binds the generic controller to one collection shape.
pub trait SyncTarget: Send + Sync + 'static {
    type Entity: SyncEntity;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn scope_source(&self) -> ScopeSource;

    /// The subscription for `scope`.
    fn query(&self, scope: &OwnerScope) -> CollectionQuery;

    /// Path of the document backing entity `id`.
    fn document_path(&self, scope: &OwnerScope, id: &str) -> DocumentPath;

    /// Client-side check applied to every decoded snapshot entity.
    fn accepts(&self, _scope: &OwnerScope, _entity: &Self::Entity) -> bool {
        true
    }

    /// Write for a flag change. Merges the single flag by default.
    fn flag_write(
        &self,
        scope: &OwnerScope,
        entity: &Self::Entity,
        flag: &str,
        value: bool,
    ) -> RemoteWrite {
        let mut fields = Fields::new();
        fields.insert(flag.to_string(), value.into());
        RemoteWrite::Set {
            path: self.document_path(scope, entity.id()),
            fields,
            merge: true,
        }
    }

    /// Write for adding an entity. Replaces the document by default.
    fn insert_write(&self, scope: &OwnerScope, entity: &Self::Entity) -> RemoteWrite {
        RemoteWrite::Set {
            path: self.document_path(scope, entity.id()),
            fields: entity.encode(),
            merge: false,
        }
    }
}
