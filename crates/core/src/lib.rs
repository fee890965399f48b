//! Mart Core - Shared types library.
//!
//! This crate provides the domain types shared by the Mart client layer:
//! - `client` - Cart / view-history reconciliation and form validation
//! - `cli` - Command-line driver for the client layer
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no local storage, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, prices, product snapshots, cart lines and API envelopes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
