//! Core types for Mart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod envelope;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use cart::CartLine;
pub use envelope::{PagingResult, UserRecord, ViewHistoryRecord};
pub use id::*;
pub use price::{format_money, line_total};
pub use product::{CategoryRef, ProductSnapshot};
pub use status::SyncStatus;
