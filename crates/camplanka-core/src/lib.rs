//! camplanka-core - Core library for CampLanka
//!
//! This crate keeps local views of remote campground wishlists, trip plans and
//! trip chats in sync with a remote document store. It contains the document
//! codec, the store abstraction (with an in-process implementation), the
//! generic optimistic sync controller and its scoped call sites.

pub mod codec;
pub mod context;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;

pub use context::AppContext;
pub use error::{Error, Result};
pub use models::{ChatMessage, Plan, WishlistItem};
pub use session::{AuthUser, SessionHub, SessionSource};
pub use state::SyncState;
pub use store::{MemoryStore, RemoteStore};
pub use sync::{FavoriteFlag, RemoteSyncController, SyncError, SyncView};
