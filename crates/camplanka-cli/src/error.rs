use std::io;

use camplanka_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] camplanka_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(
        "No user configured. Pass --user, set CAMPLANKA_USER, or run `camplanka config init --user <ID>`."
    )]
    NoUser,
    #[error("Invalid ID: '{0}'")]
    InvalidId(String),
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Message text cannot be empty")]
    EmptyMessage,
    #[error("Trip end date {end} is before start date {start}")]
    InvalidDateRange { start: String, end: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
}
