//! Best-effort remote writes.
//!
//! Reconcilers never talk to the network. Their transitions return an
//! [`Effect`] describing the write they want, and the [`EffectRunner`] owned
//! by the session spawns it without waiting. A failed effect is logged and
//! dropped: it is never retried and never rolls back local state.
//!
//! Each effect carries the state as it was at dispatch time, so when two
//! pushes race the one that completes last decides what the server holds.

use std::sync::Arc;

use mart_core::{CartLine, ProductId, UserId};
use tokio::task::JoinSet;

use crate::api::{ApiError, RemoteStore};

/// A write to the remote store requested by a reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Replace the user's server-side cart.
    PushCart {
        user_id: UserId,
        lines: Vec<CartLine>,
    },
    /// Append a product to the signed-in user's view history.
    RecordView { product_id: ProductId },
}

impl Effect {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PushCart { .. } => "push_cart",
            Self::RecordView { .. } => "record_view",
        }
    }
}

/// Perform `effect` against `remote`.
///
/// # Errors
///
/// Returns the remote store's error unchanged.
pub async fn apply<R: RemoteStore + ?Sized>(remote: &R, effect: &Effect) -> Result<(), ApiError> {
    match effect {
        Effect::PushCart { user_id, lines } => remote.put_cart(user_id, lines).await,
        Effect::RecordView { product_id } => remote.record_view(product_id).await,
    }
}

/// Spawns effects onto the tokio runtime and forgets about them.
///
/// Must be used from within a tokio runtime.
pub struct EffectRunner<R> {
    remote: Arc<R>,
    tasks: JoinSet<()>,
}

impl<R: RemoteStore> EffectRunner<R> {
    #[must_use]
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            tasks: JoinSet::new(),
        }
    }

    /// Start `effect` in the background.
    pub fn dispatch(&mut self, effect: Effect) {
        self.reap();

        let remote = Arc::clone(&self.remote);
        tracing::debug!(effect = effect.kind(), "Dispatching remote effect");
        self.tasks.spawn(async move {
            if let Err(e) = apply(remote.as_ref(), &effect).await {
                tracing::warn!(effect = effect.kind(), error = %e, "Remote sync failed");
            }
        });
    }

    /// Number of effects that have not been reaped yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every dispatched effect to finish.
    ///
    /// Used at shutdown and in tests; UI code never awaits effects.
    pub async fn settle(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join_error(result);
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join_error(result);
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Remote effect task panicked");
    }
}
