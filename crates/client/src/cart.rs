//! Cart reconciler.
//!
//! Owns the authoritative in-memory cart. The device-local `cart` snapshot
//! and the user's server-side cart are projections of it:
//!
//! - On [`Cart::initialize`] the server decides *which* products are in the
//!   cart and the local snapshot decides *how many* of each.
//! - Every mutation rewrites the whole local snapshot (see [`Persist`]).
//! - Adding a new product or removing one while signed in yields an
//!   [`Effect::PushCart`] carrying the full cart at that moment.
//!
//! Transitions are synchronous and never touch storage or the network; the
//! [`Session`](crate::session::Session) applies what they return.

use std::sync::Arc;

use mart_core::{CartLine, ProductId, SyncStatus, UserId};
use rust_decimal::Decimal;

use crate::effects::Effect;

/// What happens to a line whose amount is decremented to zero or below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepletedLinePolicy {
    /// Keep the line with its non-positive amount.
    #[default]
    Retain,
    /// Drop the line, as [`Cart::remove`] would.
    Remove,
}

/// How the local snapshot must be updated after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    /// Leave the local snapshot alone.
    Skip,
    /// Rewrite it with the current lines.
    Write,
    /// Delete the key entirely.
    Delete,
}

/// Result of a cart transition.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct CartOutcome {
    pub persist: Persist,
    pub effect: Option<Effect>,
}

impl CartOutcome {
    const fn skip() -> Self {
        Self {
            persist: Persist::Skip,
            effect: None,
        }
    }

    const fn write(effect: Option<Effect>) -> Self {
        Self {
            persist: Persist::Write,
            effect,
        }
    }
}

/// Immutable view of the cart published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub lines: Arc<[CartLine]>,
    pub status: SyncStatus,
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Self {
            lines: Arc::from(Vec::new()),
            status: SyncStatus::Pending,
        }
    }
}

impl CartSnapshot {
    /// Sum of all line amounts.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        item_count(&self.lines)
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.lines)
    }
}

fn item_count(lines: &[CartLine]) -> i64 {
    lines
        .iter()
        .fold(0_i64, |count, line| count.saturating_add(line.amount))
}

fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::total).sum()
}

/// The in-memory cart.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    status: SyncStatus,
    policy: DepletedLinePolicy,
}

impl Cart {
    #[must_use]
    pub fn new(policy: DepletedLinePolicy) -> Self {
        Self {
            lines: Vec::new(),
            status: SyncStatus::Pending,
            policy,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub const fn status(&self) -> SyncStatus {
        self.status
    }

    #[must_use]
    pub fn item_count(&self) -> i64 {
        item_count(&self.lines)
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        subtotal(&self.lines)
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: Arc::from(self.lines.as_slice()),
            status: self.status,
        }
    }

    /// Reconcile the server-known cart with the local snapshot.
    ///
    /// An empty server list means the server knows nothing and the local
    /// snapshot is taken verbatim. Otherwise every server product is kept,
    /// with its amount taken from the matching local line (or 1), products
    /// only present locally are dropped, and the reconciled cart is written
    /// back over the local snapshot.
    pub fn initialize(&mut self, server: Vec<CartLine>, local: Vec<CartLine>) -> CartOutcome {
        let persist = if server.is_empty() {
            Persist::Skip
        } else {
            Persist::Write
        };
        self.lines = if server.is_empty() {
            local
        } else {
            server
                .into_iter()
                .map(|mut line| {
                    line.amount = local
                        .iter()
                        .find(|l| l.product_id == line.product_id)
                        .map_or(1, |l| l.amount);
                    line
                })
                .collect()
        };
        self.status = SyncStatus::Ready;
        tracing::debug!(lines = self.lines.len(), "Cart reconciled");

        CartOutcome {
            persist,
            effect: None,
        }
    }

    /// Add `line.amount` units of a product.
    ///
    /// An existing line is merged (amounts add up). A new line is appended
    /// and, when signed in, the new cart is pushed to the server. Amounts
    /// of zero or less leave the cart untouched.
    pub fn add(&mut self, line: CartLine, user: Option<&UserId>) -> CartOutcome {
        if line.amount <= 0 {
            tracing::warn!(product_id = %line.product_id, amount = line.amount, "Ignoring non-positive cart add");
            return CartOutcome::skip();
        }

        if let Some(existing) = self.find_mut(&line.product_id) {
            existing.amount = existing.amount.saturating_add(line.amount);
            tracing::debug!(product_id = %line.product_id, amount = existing.amount, "Merged cart line");
            return CartOutcome::write(None);
        }

        tracing::debug!(product_id = %line.product_id, amount = line.amount, "Added cart line");
        self.lines.push(line);
        CartOutcome::write(self.push_effect(user))
    }

    /// Subtract `amount` units from a product's line.
    ///
    /// Under [`DepletedLinePolicy::Retain`] the line stays even at zero or
    /// below. Unknown products leave the cart unchanged.
    pub fn decrement(
        &mut self,
        product_id: &ProductId,
        amount: i64,
        user: Option<&UserId>,
    ) -> CartOutcome {
        let remaining = match self.find_mut(product_id) {
            Some(line) => {
                line.amount = line.amount.saturating_sub(amount);
                line.amount
            }
            None => return CartOutcome::write(None),
        };
        if remaining > 0 {
            return CartOutcome::write(None);
        }

        match self.policy {
            DepletedLinePolicy::Retain => {
                tracing::warn!(%product_id, amount = remaining, "Cart line depleted but retained");
                CartOutcome::write(None)
            }
            DepletedLinePolicy::Remove => self.remove(product_id, user),
        }
    }

    /// Drop a product's line; when signed in, push the new cart.
    pub fn remove(&mut self, product_id: &ProductId, user: Option<&UserId>) -> CartOutcome {
        self.lines.retain(|line| &line.product_id != product_id);
        tracing::debug!(%product_id, "Removed cart line");
        CartOutcome::write(self.push_effect(user))
    }

    /// Empty the cart and delete the local snapshot.
    pub fn clear(&mut self) -> CartOutcome {
        self.lines.clear();
        CartOutcome {
            persist: Persist::Delete,
            effect: None,
        }
    }

    fn find_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
    }

    fn push_effect(&self, user: Option<&UserId>) -> Option<Effect> {
        user.map(|user_id| Effect::PushCart {
            user_id: user_id.clone(),
            lines: self.lines.clone(),
        })
    }
}
