//! HTTP implementation of [`RemoteStore`].

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use mart_core::{
    CartLine, PagingResult, ProductId, ProductSnapshot, UserId, UserRecord, ViewHistoryRecord,
};

use super::{ApiError, RemoteStore};
use crate::config::ApiConfig;

/// Separator the suggestion endpoint expects between product ids.
const SUGGESTION_ID_SEPARATOR: &str = ";";

/// Remote API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::Parse(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/{segments...}`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and fail on a non-success status.
    async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        Self::send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl RemoteStore for ApiClient {
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn put_cart(&self, user_id: &UserId, lines: &[CartLine]) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", user_id.as_str()])?;
        let body = serde_json::json!({ "cart": lines });
        Self::send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_user(&self, user_id: &UserId) -> Result<UserRecord, ApiError> {
        let url = self.endpoint(&["users", user_id.as_str()])?;
        Self::send_json(self.client.get(url)).await
    }

    #[instrument(skip(self))]
    async fn fetch_view_history(&self, user_id: &UserId) -> Result<Vec<ProductSnapshot>, ApiError> {
        let mut url = self.endpoint(&["viewHistory", "paging"])?;
        url.query_pairs_mut().append_pair("userId", user_id.as_str());

        let page: PagingResult<ViewHistoryRecord> = Self::send_json(self.client.get(url)).await?;
        Ok(page.data.into_iter().map(|record| record.product).collect())
    }

    #[instrument(skip(self))]
    async fn record_view(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let url = self.endpoint(&["viewHistory", "user"])?;
        let body = serde_json::json!({ "productId": product_id });
        Self::send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    async fn suggestions(&self, ids: &[ProductId]) -> Result<Vec<ProductSnapshot>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(SUGGESTION_ID_SEPARATOR);
        let mut url = self.endpoint(&["associationRules", "suggestion"])?;
        url.query_pairs_mut().append_pair("ids", &joined);

        Self::send_json(self.client.get(url)).await
    }
}
