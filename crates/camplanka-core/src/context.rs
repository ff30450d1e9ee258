//! Application context: the store and session every sync instance shares.

use std::sync::Arc;

use crate::models::{ChatMessage, Plan, WishlistItem};
use crate::session::{AuthUser, SessionSource};
use crate::store::RemoteStore;
use crate::sync::targets::{ChatTarget, PlanTarget, WishlistTarget};
use crate::sync::{FavoriteFlag, OwnerScope, RemoteSyncController};

/// Explicitly constructed application state, passed to whatever needs sync.
#[derive(Clone)]
pub struct AppContext {
    store: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionSource>,
}

impl AppContext {
    pub fn new(store: Arc<dyn RemoteStore>, session: Arc<dyn SessionSource>) -> Self {
        Self { store, session }
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    pub fn session(&self) -> Arc<dyn SessionSource> {
        Arc::clone(&self.session)
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.current_user()
    }

    /// The signed-in user's wishlist. Follows the session.
    pub fn wishlist(&self) -> RemoteSyncController<WishlistItem> {
        RemoteSyncController::spawn(WishlistTarget, self.store(), self.session.as_ref())
    }

    /// The signed-in user's trip plans. Follows the session.
    pub fn plans(&self) -> RemoteSyncController<Plan> {
        RemoteSyncController::spawn(PlanTarget, self.store(), self.session.as_ref())
    }

    /// Chat of one trip plan, already started.
    pub fn chat(&self, plan_id: &str) -> RemoteSyncController<ChatMessage> {
        let controller =
            RemoteSyncController::spawn(ChatTarget, self.store(), self.session.as_ref());
        controller.start(OwnerScope::new(plan_id));
        controller
    }

    /// Favorite flag for a campground detail view.
    pub fn favorite(&self, item: WishlistItem) -> FavoriteFlag {
        FavoriteFlag::new(item, self.store(), self.session.as_ref())
    }
}
