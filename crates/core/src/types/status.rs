//! Status enums shared by the client-side state slices.

use serde::{Deserialize, Serialize};

/// Whether a slice has finished its first reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Not yet reconciled with the remote store.
    #[default]
    Pending,
    /// Reconciled; the slice holds the authoritative view.
    Ready,
}

impl SyncStatus {
    /// Returns true once reconciliation has completed.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}
