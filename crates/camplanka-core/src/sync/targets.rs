//! The collections the app keeps in sync.

use super::{OwnerScope, RemoteWrite, ScopeSource, SyncTarget};
use crate::codec::SyncEntity;
use crate::models::{ChatMessage, Plan, WishlistItem, IS_FAVORITE};
use crate::store::{
    server_timestamp, CollectionPath, CollectionQuery, Direction, DocumentPath, FieldValue, Fields,
};

/// `users/{uid}/wishlist`
pub fn wishlist_collection(user_id: &str) -> CollectionPath {
    CollectionPath::root("users")
        .doc(user_id)
        .collection("wishlist")
}

/// `plans/{planId}/chats`
pub fn chat_collection(plan_id: &str) -> CollectionPath {
    CollectionPath::root("plans").doc(plan_id).collection("chats")
}

/// Top-level `plans`
pub fn plans_collection() -> CollectionPath {
    CollectionPath::root("plans")
}

/// Write that marks `item` as a favorite of `user_id`, or removes it.
///
/// Favoriting stores the campground summary with a server `addedAt`;
/// unfavoriting deletes the wishlist document.
pub fn favorite_write(user_id: &str, item: &WishlistItem, favorite: bool) -> RemoteWrite {
    let path = wishlist_collection(user_id).doc(&item.id);
    if favorite {
        let mut fields = item.encode();
        fields.insert(IS_FAVORITE.to_string(), FieldValue::Boolean(true));
        fields.insert("addedAt".to_string(), server_timestamp());
        RemoteWrite::Set {
            path,
            fields,
            merge: true,
        }
    } else {
        RemoteWrite::Delete { path }
    }
}

/// The signed-in user's wishlist.
#[derive(Debug, Clone, Copy, Default)]
pub struct WishlistTarget;

impl SyncTarget for WishlistTarget {
    type Entity = WishlistItem;

    fn name(&self) -> &'static str {
        "wishlist"
    }

    fn scope_source(&self) -> ScopeSource {
        ScopeSource::Session
    }

    fn query(&self, scope: &OwnerScope) -> CollectionQuery {
        CollectionQuery::new(wishlist_collection(scope.as_str()))
    }

    fn document_path(&self, scope: &OwnerScope, id: &str) -> DocumentPath {
        wishlist_collection(scope.as_str()).doc(id)
    }

    fn flag_write(
        &self,
        scope: &OwnerScope,
        entity: &WishlistItem,
        flag: &str,
        value: bool,
    ) -> RemoteWrite {
        if flag == IS_FAVORITE {
            return favorite_write(scope.as_str(), entity, value);
        }

        let mut fields = Fields::new();
        fields.insert(flag.to_string(), value.into());
        RemoteWrite::Set {
            path: self.document_path(scope, entity.id()),
            fields,
            merge: true,
        }
    }
}

/// Messages of one trip plan, oldest first. Append-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatTarget;

impl SyncTarget for ChatTarget {
    type Entity = ChatMessage;

    fn name(&self) -> &'static str {
        "chat"
    }

    fn scope_source(&self) -> ScopeSource {
        ScopeSource::Explicit
    }

    fn query(&self, scope: &OwnerScope) -> CollectionQuery {
        CollectionQuery::new(chat_collection(scope.as_str()))
            .order_by("timestamp", Direction::Ascending)
    }

    fn document_path(&self, scope: &OwnerScope, id: &str) -> DocumentPath {
        chat_collection(scope.as_str()).doc(id)
    }
}

/// Plans owned by the signed-in user.
///
/// `plans` is a top-level collection filtered on `userId`. Snapshot entries
/// owned by someone else are dropped on the client as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanTarget;

impl SyncTarget for PlanTarget {
    type Entity = Plan;

    fn name(&self) -> &'static str {
        "plans"
    }

    fn scope_source(&self) -> ScopeSource {
        ScopeSource::Session
    }

    fn query(&self, scope: &OwnerScope) -> CollectionQuery {
        CollectionQuery::new(plans_collection()).where_eq("userId", scope.as_str())
    }

    fn document_path(&self, _scope: &OwnerScope, id: &str) -> DocumentPath {
        plans_collection().doc(id)
    }

    fn accepts(&self, scope: &OwnerScope, entity: &Plan) -> bool {
        entity.user_id == scope.as_str()
    }

    fn insert_write(&self, scope: &OwnerScope, entity: &Plan) -> RemoteWrite {
        let mut fields = entity.encode();
        fields.insert("userId".to_string(), scope.as_str().into());
        RemoteWrite::Set {
            path: self.document_path(scope, entity.id()),
            fields,
            merge: false,
        }
    }
}
