//! Error types for camplanka-core

use thiserror::Error;

use crate::store::StoreError;
use crate::sync::SyncError;

/// Result type alias using camplanka-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in camplanka-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Sync controller error
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
