//! Mart Client - cart and view-history reconciliation.
//!
//! This crate is the client-side layer between the storefront UI and two
//! sources of truth: a durable per-device local store and the authoritative
//! remote API. It also hosts the rule-based validation engine every form
//! uses.
//!
//! # Architecture
//!
//! - Reconcilers ([`cart`], [`view_history`]) are synchronous state machines.
//!   Their transitions return what must be persisted locally and an optional
//!   [`effects::Effect`] for the remote store.
//! - [`session::Session`] applies those results: it rewrites the local
//!   snapshot, hands effects to a fire-and-forget runner and publishes
//!   immutable snapshots on `watch` channels.
//! - Remote failures during best-effort pushes are logged and dropped; the
//!   local state stays authoritative for display.
//!
//! # Modules
//!
//! - [`validation`] - Field rules, the engine and form state
//! - [`cart`] - Cart reconciler
//! - [`view_history`] - Recently viewed products
//! - [`notify`] - Toast and layout signals
//! - [`effects`] - Remote effects and their runner
//! - [`store`] - Durable local store
//! - [`api`] - Remote API client
//! - [`session`] - Application-state container
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod effects;
pub mod notify;
pub mod session;
pub mod store;
pub mod validation;
pub mod view_history;

pub use api::{ApiClient, ApiError, RemoteStore};
pub use cart::{Cart, CartSnapshot, DepletedLinePolicy};
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use session::Session;
pub use store::{FileStore, LocalStore, MemoryStore, StoreError};
pub use view_history::{ViewHistory, ViewHistorySnapshot};
