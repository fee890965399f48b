//! Client application state.
//!
//! [`Session`] is the single container the UI layer is handed: it owns the
//! cart and view-history reconcilers, the notifiers, the current identity,
//! the durable local store and the effect runner. Every operation follows
//! the same unit of work:
//!
//! 1. run a synchronous reconciler transition,
//! 2. rewrite (or delete) the local snapshot,
//! 3. dispatch the returned effect without awaiting it,
//! 4. publish a fresh immutable snapshot on the slice's `watch` channel.
//!
//! All mutations come from one task; the session is not shared between
//! threads and takes `&mut self` throughout.

use std::sync::Arc;

use mart_core::{CartLine, ProductId, ProductSnapshot, UserId, ViewHistoryRecord};
use tokio::sync::watch;
use tracing::instrument;

use crate::api::{ApiError, RemoteStore};
use crate::cart::{Cart, CartOutcome, CartSnapshot, DepletedLinePolicy, Persist};
use crate::effects::{Effect, EffectRunner};
use crate::notify::{Layout, Severity, Toast};
use crate::store::{LocalStore, keys, read_json, write_json};
use crate::view_history::{ViewHistory, ViewHistorySnapshot};

/// Ids sent to the recommendation service: cart products, then viewed ones.
///
/// The two lists are concatenated as they are; the service treats the ids
/// as a set.
#[must_use]
pub fn suggestion_ids(cart: &[CartLine], viewed: &[ProductId]) -> Vec<ProductId> {
    cart.iter()
        .map(|line| line.product_id.clone())
        .chain(viewed.iter().cloned())
        .collect()
}

/// The client-side application state.
pub struct Session<S, R> {
    store: S,
    remote: Arc<R>,
    runner: EffectRunner<R>,
    identity: Option<UserId>,
    cart: Cart,
    view_history: ViewHistory,
    toast: Toast,
    layout: Layout,
    cart_tx: watch::Sender<CartSnapshot>,
    history_tx: watch::Sender<ViewHistorySnapshot>,
    toast_tx: watch::Sender<Toast>,
    layout_tx: watch::Sender<Layout>,
}

impl<S: LocalStore, R: RemoteStore> Session<S, R> {
    /// Create a session over a local store and a remote store.
    #[must_use]
    pub fn new(store: S, remote: Arc<R>, policy: DepletedLinePolicy) -> Self {
        let (cart_tx, _) = watch::channel(CartSnapshot::default());
        let (history_tx, _) = watch::channel(ViewHistorySnapshot::default());
        let (toast_tx, _) = watch::channel(Toast::default());
        let (layout_tx, _) = watch::channel(Layout::default());

        Self {
            store,
            runner: EffectRunner::new(Arc::clone(&remote)),
            remote,
            identity: None,
            cart: Cart::new(policy),
            view_history: ViewHistory::new(),
            toast: Toast::default(),
            layout: Layout::default(),
            cart_tx,
            history_tx,
            toast_tx,
            layout_tx,
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    #[must_use]
    pub const fn identity(&self) -> Option<&UserId> {
        self.identity.as_ref()
    }

    /// Switch to authenticated mode.
    pub fn sign_in(&mut self, user_id: UserId) {
        tracing::info!(%user_id, "Session signed in");
        self.identity = Some(user_id);
    }

    /// Switch back to anonymous (local-only) mode.
    pub fn sign_out(&mut self) {
        if let Some(user_id) = self.identity.take() {
            tracing::info!(%user_id, "Session signed out");
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Reconcile the cart at session start.
    ///
    /// When signed in, the user's server-side cart is fetched first; if that
    /// fails the session falls back to the local snapshot alone.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> CartSnapshot {
        let server = match &self.identity {
            Some(user_id) => match self.remote.fetch_user(user_id).await {
                Ok(user) => user.cart,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch server cart, using local cart");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        self.initialize_cart(server)
    }

    /// Reconcile the cart with an already known server cart.
    pub fn initialize_cart(&mut self, server: Vec<CartLine>) -> CartSnapshot {
        let local: Vec<CartLine> = read_json(&self.store, keys::CART);
        let outcome = self.cart.initialize(server, local);
        tracing::info!(lines = self.cart.lines().len(), "Cart ready");
        self.apply_cart(outcome)
    }

    pub fn add_to_cart(&mut self, line: CartLine) -> CartSnapshot {
        let outcome = self.cart.add(line, self.identity.as_ref());
        self.apply_cart(outcome)
    }

    pub fn decrement(&mut self, product_id: &ProductId, amount: i64) -> CartSnapshot {
        let outcome = self
            .cart
            .decrement(product_id, amount, self.identity.as_ref());
        self.apply_cart(outcome)
    }

    pub fn remove_from_cart(&mut self, product_id: &ProductId) -> CartSnapshot {
        let outcome = self.cart.remove(product_id, self.identity.as_ref());
        self.apply_cart(outcome)
    }

    pub fn clear_cart(&mut self) -> CartSnapshot {
        let outcome = self.cart.clear();
        self.apply_cart(outcome)
    }

    #[must_use]
    pub fn cart(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    #[must_use]
    pub fn subscribe_cart(&self) -> watch::Receiver<CartSnapshot> {
        self.cart_tx.subscribe()
    }

    fn apply_cart(&mut self, outcome: CartOutcome) -> CartSnapshot {
        let result = match outcome.persist {
            Persist::Skip => Ok(()),
            Persist::Write => write_json(&self.store, keys::CART, self.cart.lines()),
            Persist::Delete => self.store.remove(keys::CART),
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Failed to persist local cart");
        }

        self.dispatch(outcome.effect);

        let snapshot = self.cart.snapshot();
        self.cart_tx.send_replace(snapshot.clone());
        snapshot
    }

    // =========================================================================
    // View history
    // =========================================================================

    /// Seed the view history from remote records or the local snapshot.
    pub fn init_view_history(&mut self, remote: Vec<ViewHistoryRecord>) -> ViewHistorySnapshot {
        let local: Vec<ProductSnapshot> = read_json(&self.store, keys::VIEW_HISTORY);
        self.view_history.initialize(remote, local);
        self.publish_history()
    }

    /// Seed the view history at session start.
    ///
    /// Signed-in sessions fetch the server copy first; an empty or failed
    /// fetch falls back to the local snapshot.
    #[instrument(skip(self))]
    pub async fn load_view_history(&mut self) -> ViewHistorySnapshot {
        let remote = match &self.identity {
            Some(user_id) => match self.remote.fetch_view_history(user_id).await {
                Ok(products) => products
                    .into_iter()
                    .map(|product| ViewHistoryRecord { product })
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch view history, using local copy");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        self.init_view_history(remote)
    }

    /// Record that the user viewed `product`.
    ///
    /// Signed-in sessions resolve the current history from the remote store,
    /// anonymous ones from the local snapshot. The local snapshot is always
    /// rewritten afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the remote history cannot be fetched. The
    /// published history is reset to empty in that case.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn record_view(
        &mut self,
        product: ProductSnapshot,
    ) -> Result<ViewHistorySnapshot, ApiError> {
        let resolved = match &self.identity {
            Some(user_id) => match self.remote.fetch_view_history(user_id).await {
                Ok(products) => products,
                Err(e) => {
                    self.view_history.reset();
                    self.publish_history();
                    return Err(e);
                }
            },
            None => read_json(&self.store, keys::VIEW_HISTORY),
        };

        let outcome = self
            .view_history
            .record(resolved, product, self.identity.as_ref());

        if let Err(e) = write_json(
            &self.store,
            keys::VIEW_HISTORY,
            &self.view_history.entries(),
        ) {
            tracing::error!(error = %e, "Failed to persist local view history");
        }
        self.dispatch(outcome.effect);

        Ok(self.publish_history())
    }

    #[must_use]
    pub fn view_history(&self) -> ViewHistorySnapshot {
        self.view_history.snapshot()
    }

    #[must_use]
    pub fn subscribe_view_history(&self) -> watch::Receiver<ViewHistorySnapshot> {
        self.history_tx.subscribe()
    }

    fn publish_history(&self) -> ViewHistorySnapshot {
        let snapshot = self.view_history.snapshot();
        self.history_tx.send_replace(snapshot.clone());
        snapshot
    }

    // =========================================================================
    // Recommendations
    // =========================================================================

    /// Products suggested for the current cart and view history.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the recommendation request fails.
    pub async fn suggestions(&self) -> Result<Vec<ProductSnapshot>, ApiError> {
        let ids = suggestion_ids(self.cart.lines(), &self.view_history.ordered_ids());
        self.remote.suggestions(&ids).await
    }

    // =========================================================================
    // Notifiers
    // =========================================================================

    pub fn open_toast(&mut self, message: impl Into<String>, severity: Severity) {
        self.toast.open(message, severity);
        self.toast_tx.send_replace(self.toast.clone());
    }

    pub fn close_toast(&mut self) {
        self.toast.close();
        self.toast_tx.send_replace(self.toast.clone());
    }

    pub fn toggle_scroll_signal(&mut self) {
        self.layout.toggle_scroll_signal();
        self.layout_tx.send_replace(self.layout);
    }

    #[must_use]
    pub fn subscribe_toast(&self) -> watch::Receiver<Toast> {
        self.toast_tx.subscribe()
    }

    #[must_use]
    pub fn subscribe_layout(&self) -> watch::Receiver<Layout> {
        self.layout_tx.subscribe()
    }

    // =========================================================================
    // Effects
    // =========================================================================

    /// Wait for all in-flight remote writes.
    pub async fn settle(&mut self) {
        self.runner.settle().await;
    }

    fn dispatch(&mut self, effect: Option<Effect>) {
        if let Some(effect) = effect {
            self.runner.dispatch(effect);
        }
    }
}
