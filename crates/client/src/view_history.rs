//! View-history reconciler.
//!
//! Keeps the recently viewed products: no duplicate ids, at most
//! [`VIEW_HISTORY_CAPACITY`] entries, newest at the tail. When a new view
//! overflows the bound the oldest entries are dropped from the head.
//!
//! Resolving the current list is the caller's job (remote history when
//! signed in, the local snapshot otherwise); [`ViewHistory::record`] only
//! applies the view to what was resolved.

use std::collections::VecDeque;
use std::sync::Arc;

use mart_core::{ProductId, ProductSnapshot, SyncStatus, UserId, ViewHistoryRecord};

use crate::effects::Effect;

/// Maximum number of remembered views.
pub const VIEW_HISTORY_CAPACITY: usize = 4;

/// Immutable view of the history published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewHistorySnapshot {
    /// Product snapshots, oldest first.
    pub entries: Arc<[ProductSnapshot]>,
    /// Ids of `entries`, in the same order.
    pub ordered_ids: Arc<[ProductId]>,
    pub status: SyncStatus,
}

impl Default for ViewHistorySnapshot {
    fn default() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            ordered_ids: Arc::from(Vec::new()),
            status: SyncStatus::Pending,
        }
    }
}

/// Result of recording a view.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ViewOutcome {
    /// False when the product was already in the history.
    pub recorded: bool,
    pub effect: Option<Effect>,
}

#[derive(Debug, Clone, Default)]
pub struct ViewHistory {
    entries: VecDeque<ProductSnapshot>,
    status: SyncStatus,
}

impl ViewHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the history at session start.
    ///
    /// Remote records win when there are any; otherwise the local snapshot
    /// is used.
    pub fn initialize(&mut self, remote: Vec<ViewHistoryRecord>, local: Vec<ProductSnapshot>) {
        let products = if remote.is_empty() {
            local
        } else {
            remote.into_iter().map(|record| record.product).collect()
        };
        self.replace(products);
        self.status = SyncStatus::Ready;
    }

    /// Apply a view of `product` on top of the `resolved` history.
    ///
    /// Viewing a product already in the history changes nothing. Otherwise it
    /// is appended, the head is evicted down to capacity and, when signed in,
    /// an [`Effect::RecordView`] is returned.
    pub fn record(
        &mut self,
        resolved: Vec<ProductSnapshot>,
        product: ProductSnapshot,
        user: Option<&UserId>,
    ) -> ViewOutcome {
        self.replace(resolved);
        self.status = SyncStatus::Ready;

        if self.contains(&product.id) {
            return ViewOutcome {
                recorded: false,
                effect: None,
            };
        }

        let effect = user.map(|_| Effect::RecordView {
            product_id: product.id.clone(),
        });
        tracing::debug!(product_id = %product.id, "Recorded product view");
        self.entries.push_back(product);
        self.evict();

        ViewOutcome {
            recorded: true,
            effect,
        }
    }

    /// Forget everything, e.g. after a failed remote fetch.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.entries.iter().any(|p| &p.id == product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first, for the local snapshot.
    #[must_use]
    pub fn entries(&self) -> Vec<ProductSnapshot> {
        self.entries.iter().cloned().collect()
    }

    #[must_use]
    pub fn ordered_ids(&self) -> Vec<ProductId> {
        self.entries.iter().map(|p| p.id.clone()).collect()
    }

    #[must_use]
    pub fn snapshot(&self) -> ViewHistorySnapshot {
        ViewHistorySnapshot {
            entries: self.entries.iter().cloned().collect(),
            ordered_ids: self.entries.iter().map(|p| p.id.clone()).collect(),
            status: self.status,
        }
    }

    /// Load `products`, dropping later duplicates and keeping the newest
    /// `VIEW_HISTORY_CAPACITY`.
    fn replace(&mut self, products: Vec<ProductSnapshot>) {
        self.entries.clear();
        for product in products {
            if !self.contains(&product.id) {
                self.entries.push_back(product);
            }
        }
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > VIEW_HISTORY_CAPACITY {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::trace!(product_id = %evicted.id, "Evicted from view history");
            }
        }
    }
}
