//! Auth session collaborator.
//!
//! Sync is gated on session presence: controllers watch the session and drop
//! their collections on sign-out.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Name shown next to chat messages.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Source of the current signed-in user.
pub trait SessionSource: Send + Sync {
    /// The signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// Receiver notified on every sign-in and sign-out.
    fn watch_session(&self) -> watch::Receiver<Option<AuthUser>>;

    /// The session (user) id, if signed in.
    fn current_session_id(&self) -> Option<String> {
        self.current_user().map(|user| user.id)
    }
}

/// In-process session holder.
#[derive(Debug)]
pub struct SessionHub {
    sender: watch::Sender<Option<AuthUser>>,
}

impl SessionHub {
    pub fn signed_out() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn signed_in(user: AuthUser) -> Self {
        let (sender, _) = watch::channel(Some(user));
        Self { sender }
    }

    pub fn sign_in(&self, user: AuthUser) {
        tracing::info!(user = %user.id, "Signed in");
        self.sender.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        if self.sender.send_replace(None).is_some() {
            tracing::info!("Signed out");
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl SessionSource for SessionHub {
    fn current_user(&self) -> Option<AuthUser> {
        self.sender.borrow().clone()
    }

    fn watch_session(&self) -> watch::Receiver<Option<AuthUser>> {
        self.sender.subscribe()
    }
}
