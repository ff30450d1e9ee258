//! Shared sync state types.

use std::fmt;

/// Lifecycle of a sync controller's subscription.
///
/// There is no error state: remote failures are reported through the
/// controller's `last_error` while it stays `Live`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Subscribing,
    Live,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Subscribing => "subscribing",
            Self::Live => "live",
        };
        f.write_str(label)
    }
}
