use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use camplanka_core::codec::SyncEntity;
use camplanka_core::util::{is_valid_segment, normalize_text_option};
use camplanka_core::{
    AppContext, AuthUser, ChatMessage, MemoryStore, Plan, RemoteSyncController, SessionHub,
    SyncView, WishlistItem,
};
use chrono::{DateTime, Utc};
use tokio::time::timeout;

use crate::config::CliConfig;
use crate::error::CliError;

const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Local store plus the signed-in user for one CLI invocation.
pub struct Workspace {
    store: MemoryStore,
    context: AppContext,
    user: AuthUser,
    data_path: PathBuf,
}

impl Workspace {
    /// Resolve user and store file from flags, environment and config.
    pub fn open(data: Option<PathBuf>, user: Option<&str>) -> Result<Self, CliError> {
        let config = CliConfig::load().map_err(CliError::Config)?;
        let data_path = config.resolve_data_path(data).map_err(CliError::Config)?;
        let user_id = config.resolve_user(user).ok_or(CliError::NoUser)?;
        let user_id = normalize_identifier(&user_id)?;

        let mut user = AuthUser::new(user_id);
        if let Some(display_name) = config.display_name {
            user = user.with_display_name(display_name);
        }
        Self::load(data_path, user)
    }

    pub fn load(data_path: PathBuf, user: AuthUser) -> Result<Self, CliError> {
        let store = MemoryStore::load(&data_path)?;
        let session = Arc::new(SessionHub::signed_in(user.clone()));
        let context = AppContext::new(Arc::new(store.clone()), session);
        tracing::debug!(user = %user.id, "Opened store at {}", data_path.display());
        Ok(Self {
            store,
            context,
            user,
            data_path,
        })
    }

    pub const fn context(&self) -> &AppContext {
        &self.context
    }

    pub const fn user(&self) -> &AuthUser {
        &self.user
    }

    /// Persist every document back to the store file.
    pub async fn save(&self) -> Result<(), CliError> {
        self.store.save(&self.data_path).await?;
        Ok(())
    }
}

/// Wait for the first snapshot of `controller`.
pub async fn wait_live<T: SyncEntity>(
    controller: &RemoteSyncController<T>,
    what: &'static str,
) -> Result<SyncView<T>, CliError> {
    let view = timeout(SNAPSHOT_TIMEOUT, controller.wait_until_live())
        .await
        .map_err(|_| CliError::Timeout(what))??;
    Ok(view)
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let id = id.trim();
    if is_valid_segment(id) {
        Ok(id.to_string())
    } else {
        Err(CliError::InvalidId(id.to_string()))
    }
}

pub fn normalize_name(name: &str) -> Result<String, CliError> {
    normalize_text_option(Some(name.to_string())).ok_or(CliError::EmptyName)
}

pub fn format_wishlist_lines(items: &[WishlistItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let marker = if item.is_favorite { '*' } else { ' ' };
            let location = if item.location.is_empty() {
                String::new()
            } else {
                format!(" ({})", item.location)
            };
            format!(
                "{marker} {}  {}{location}  {:.1}",
                item.id, item.name, item.rating
            )
        })
        .collect()
}

pub fn format_plan_lines(plans: &[Plan]) -> Vec<String> {
    plans
        .iter()
        .map(|plan| {
            let mut line = format!("{}  {}", plan.id, plan.name);
            if !plan.campground_name.is_empty() {
                line.push_str(&format!(" @ {}", plan.campground_name));
            }
            if let (Some(start), Some(end)) = (plan.start_date, plan.end_date) {
                line.push_str(&format!(
                    "  {} to {}",
                    start.format("%Y-%m-%d"),
                    end.format("%Y-%m-%d")
                ));
            }
            if !plan.participants.is_empty() {
                line.push_str(&format!("  [{}]", plan.participants.join(", ")));
            }
            line
        })
        .collect()
}

pub fn format_chat_lines(messages: &[ChatMessage], user_id: &str) -> Vec<String> {
    messages
        .iter()
        .map(|message| {
            let sender = if message.is_from(user_id) {
                "you"
            } else if message.sender_name.is_empty() {
                message.sender_id.as_str()
            } else {
                message.sender_name.as_str()
            };
            format!(
                "[{}] {sender}: {}",
                format_timestamp(message.sent_at),
                message.text
            )
        })
        .collect()
}

pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || "pending".to_string(),
        |timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string(),
    )
}
