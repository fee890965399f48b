//! Remote API access.
//!
//! # Architecture
//!
//! - [`RemoteStore`] is the boundary the reconcilers and the effect runner
//!   talk to; tests drive the layer with fakes.
//! - [`ApiClient`] implements it over HTTP with `reqwest`.
//! - The remote API is authoritative for cart *membership* and for the
//!   signed-in user's view history; it owns paging, filtering and the
//!   association-rule mining behind suggestions.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |---|---|
//! | [`RemoteStore::put_cart`] | `PUT /users/{id}` `{ "cart": [...] }` |
//! | [`RemoteStore::fetch_user`] | `GET /users/{id}` |
//! | [`RemoteStore::fetch_view_history`] | `GET /viewHistory/paging?userId=…` |
//! | [`RemoteStore::record_view`] | `POST /viewHistory/user` `{ "productId" }` |
//! | [`RemoteStore::suggestions`] | `GET /associationRules/suggestion?ids=a;b;c` |

mod client;

pub use client::ApiClient;

use std::future::Future;

use mart_core::{CartLine, ProductId, ProductSnapshot, UserId, UserRecord};
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors that can occur when talking to the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The configured base URL cannot have path segments appended.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP status, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) | Self::InvalidBaseUrl(_) => None,
        }
    }

    /// Field errors carried by a `400` validation response.
    ///
    /// Empty for every other error.
    #[must_use]
    pub fn field_errors(&self) -> ValidationErrors {
        let Self::Api { status, message } = self else {
            return ValidationErrors::default();
        };
        serde_json::from_str::<serde_json::Value>(message).map_or_else(
            |_| ValidationErrors::default(),
            |body| ValidationErrors::from_server_response(*status, &body),
        )
    }
}

/// The authoritative remote store.
pub trait RemoteStore: Send + Sync + 'static {
    /// Replace the user's cart with `lines`.
    fn put_cart(
        &self,
        user_id: &UserId,
        lines: &[CartLine],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Fetch the user record, including its server-known cart.
    fn fetch_user(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<UserRecord, ApiError>> + Send;

    /// Fetch the products the user has viewed, oldest first.
    fn fetch_view_history(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Vec<ProductSnapshot>, ApiError>> + Send;

    /// Record a product view for the signed-in user.
    fn record_view(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Products frequently bought together with `ids`.
    fn suggestions(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<ProductSnapshot>, ApiError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_from_validation_response() {
        let err = ApiError::Api {
            status: 400,
            message: r#"{"msg":"invalid","error":[{"field":"email","value":"x","msg":"Email sai"}]}"#
                .to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.field_errors().get("email"), Some("Email sai"));
    }

    #[test]
    fn test_field_errors_empty_for_other_errors() {
        let err = ApiError::Api {
            status: 500,
            message: "oops".to_string(),
        };
        assert!(err.field_errors().is_empty());
        assert!(ApiError::Parse("x".to_string()).field_errors().is_empty());
    }
}
