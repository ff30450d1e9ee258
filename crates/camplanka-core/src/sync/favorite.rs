//! Favorite flag for a single campground detail view.
//!
//! Unlike the collection controllers this tracks one boolean: whether the
//! signed-in user's wishlist holds a document for the campground. The value
//! resets to not favorited whenever the session user changes; call
//! [`FavoriteFlag::refresh`] to read it for the new user.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::watch;

use super::targets::{favorite_write, wishlist_collection};
use super::SyncError;
use crate::models::WishlistItem;
use crate::session::{AuthUser, SessionSource};
use crate::store::RemoteStore;
use crate::util::compact_text;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteView {
    pub is_favorite: bool,
    pub last_error: Option<String>,
}

/// Optimistic favorite toggle for one campground.
pub struct FavoriteFlag {
    item: WishlistItem,
    store: Arc<dyn RemoteStore>,
    session: watch::Receiver<Option<AuthUser>>,
    view: Arc<watch::Sender<FavoriteView>>,
    in_flight: AtomicBool,
}

/// Held while a toggle is unconfirmed. Dropping it unsettled, including when
/// the toggle future is cancelled, restores the previous value.
struct InFlight<'a> {
    flag: &'a FavoriteFlag,
    user_id: String,
    previous: bool,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled && self.flag.user_id().as_deref() == Some(self.user_id.as_str()) {
            self.flag.set_favorite(self.previous);
        }
        self.flag.in_flight.store(false, Ordering::Release);
    }
}

impl FavoriteFlag {
    /// `item` carries the campground summary written on favorite.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(item: WishlistItem, store: Arc<dyn RemoteStore>, session: &dyn SessionSource) -> Self {
        let (view, _) = watch::channel(FavoriteView::default());
        let view = Arc::new(view);
        let session = session.watch_session();
        tokio::spawn(reset_on_session_change(
            session.clone(),
            Arc::downgrade(&view),
        ));
        Self {
            item,
            store,
            session,
            view,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn item(&self) -> &WishlistItem {
        &self.item
    }

    pub fn is_favorite(&self) -> bool {
        self.view.borrow().is_favorite
    }

    pub fn view(&self) -> FavoriteView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoriteView> {
        self.view.subscribe()
    }

    pub fn clear_error(&self) {
        self.view
            .send_if_modified(|view| view.last_error.take().is_some());
    }

    /// Read the current state from the store.
    ///
    /// Signed out reads as not favorited.
    pub async fn refresh(&self) -> Result<bool, SyncError> {
        let Some(user_id) = self.user_id() else {
            self.set_favorite(false);
            return Ok(false);
        };

        let path = wishlist_collection(&user_id).doc(&self.item.id);
        match self.store.get_document(&path).await {
            Ok(document) => {
                let favorite = document.is_some();
                self.set_favorite(favorite);
                Ok(favorite)
            }
            Err(error) => {
                let error = SyncError::from(error);
                self.report(&error);
                Err(error)
            }
        }
    }

    /// Flip the flag, then write it. Reverts on failure.
    ///
    /// Returns the confirmed value.
    pub async fn toggle(&self) -> Result<bool, SyncError> {
        let Some(user_id) = self.user_id() else {
            let error = SyncError::SessionRequired;
            self.report(&error);
            return Err(error);
        };
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Err(SyncError::MutationInFlight(self.item.id.clone()));
        }

        let previous = self.is_favorite();
        let requested = !previous;
        let mut guard = InFlight {
            flag: self,
            user_id: user_id.clone(),
            previous,
            settled: false,
        };
        self.set_favorite(requested);

        let result = favorite_write(&user_id, &self.item, requested)
            .apply(self.store.as_ref())
            .await;

        match result {
            Ok(()) => {
                guard.settled = true;
                tracing::debug!(campground = %self.item.id, favorite = requested, "Favorite updated");
                Ok(requested)
            }
            Err(error) => {
                drop(guard);
                let error = SyncError::from(error);
                self.report(&error);
                Err(error)
            }
        }
    }

    fn user_id(&self) -> Option<String> {
        self.session.borrow().as_ref().map(|user| user.id.clone())
    }

    fn set_favorite(&self, favorite: bool) {
        self.view.send_if_modified(|view| {
            let changed = view.is_favorite != favorite;
            view.is_favorite = favorite;
            changed
        });
    }

    fn report(&self, error: &SyncError) {
        tracing::warn!(campground = %self.item.id, "Favorite failed: {}", error);
        let message = compact_text(&error.to_string());
        self.view.send_modify(|view| view.last_error = Some(message));
    }
}

/// Clear the flag when the session user changes. Ends with the session
/// source or once the flag is dropped.
async fn reset_on_session_change(
    mut session: watch::Receiver<Option<AuthUser>>,
    view: Weak<watch::Sender<FavoriteView>>,
) {
    let mut user_id = session.borrow_and_update().as_ref().map(|user| user.id.clone());
    while session.changed().await.is_ok() {
        let Some(view) = view.upgrade() else {
            break;
        };
        let next = session.borrow_and_update().as_ref().map(|user| user.id.clone());
        if next != user_id {
            user_id = next;
            view.send_if_modified(|view| std::mem::take(&mut view.is_favorite));
        }
    }
}
