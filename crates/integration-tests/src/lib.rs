//! Integration tests for the Mart client layer.
//!
//! The tests drive a real [`ApiClient`](mart_client::ApiClient) and
//! [`Session`](mart_client::Session) against [`FakeApi`], an in-process
//! `axum` server that speaks the remote API's wire format and records every
//! request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mart-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Cart reconciliation and server pushes
//! - `view_history` - View history fetch and recording
//! - `suggestions` - Recommendation queries
//! - `api_errors` - Error statuses and server-side field errors

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use mart_client::ApiConfig;
use mart_core::{CartLine, ProductSnapshot, UserId};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Token every test client is configured with.
pub const TEST_TOKEN: &str = "test-token";

/// One request as the fake API saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    /// Path below the API prefix, e.g. `/users/u1`
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Default)]
struct ApiState {
    carts: Mutex<HashMap<String, Value>>,
    history: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    failure: Mutex<Option<(StatusCode, Value)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ApiState {
    fn record(
        &self,
        method: Method,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Value,
    ) -> Option<Response> {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        lock(&self.requests).push(RecordedRequest {
            method,
            path,
            query,
            authorization,
            body,
        });

        lock(&self.failure)
            .clone()
            .map(|(status, body)| (status, Json(body)).into_response())
    }
}

type Shared = Arc<ApiState>;

/// In-process fake of the remote API.
///
/// The server is stopped when the value is dropped.
pub struct FakeApi {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeApi {
    /// Bind to an ephemeral local port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Shared::default();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let app = Router::new().nest("/api", routes()).with_state(Arc::clone(&state));
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Client configuration pointing at this server.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a valid URL.
    #[must_use]
    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            base_url: Url::parse(&format!("http://{}/api/", self.addr))
                .expect("Invalid fake API URL"),
            token: Some(SecretString::from(TEST_TOKEN.to_string())),
            timeout: Duration::from_secs(5),
        }
    }

    /// Store a server-side cart for `user_id`.
    pub fn seed_cart(&self, user_id: &UserId, lines: &[CartLine]) {
        lock(&self.state.carts).insert(user_id.to_string(), json!(lines));
    }

    /// Store a server-side view history for `user_id`, oldest first.
    pub fn seed_history(&self, user_id: &UserId, products: &[ProductSnapshot]) {
        let records = products
            .iter()
            .map(|product| json!({ "product": product }))
            .collect();
        lock(&self.state.history).insert(user_id.to_string(), records);
    }

    /// Answer every following request with `status` and `body`.
    pub fn fail_with(&self, status: StatusCode, body: Value) {
        *lock(&self.state.failure) = Some((status, body));
    }

    /// Serve requests normally again.
    pub fn recover(&self) {
        *lock(&self.state.failure) = None;
    }

    /// The cart last stored for `user_id`.
    #[must_use]
    pub fn cart(&self, user_id: &UserId) -> Option<Value> {
        lock(&self.state.carts).get(user_id.as_str()).cloned()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Requests received for `method` and `path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == *method && r.path == path)
            .collect()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn routes() -> Router<Shared> {
    Router::new()
        .route("/users/{id}", get(get_user).put(put_user))
        .route("/viewHistory/paging", get(view_history_paging))
        .route("/viewHistory/user", post(record_view))
        .route("/associationRules/suggestion", get(suggestion))
}

async fn get_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let path = format!("/users/{id}");
    if let Some(failure) = state.record(Method::GET, path, HashMap::new(), &headers, Value::Null) {
        return failure;
    }

    let cart = lock(&state.carts).get(&id).cloned().unwrap_or_else(|| json!([]));
    Json(json!({ "id": id, "cart": cart })).into_response()
}

async fn put_user(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/users/{id}");
    if let Some(failure) = state.record(Method::PUT, path, HashMap::new(), &headers, body.clone()) {
        return failure;
    }

    let cart = body.get("cart").cloned().unwrap_or_else(|| json!([]));
    lock(&state.carts).insert(id.clone(), cart.clone());
    Json(json!({ "id": id, "cart": cart })).into_response()
}

async fn view_history_paging(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let user_id = query.get("userId").cloned().unwrap_or_default();
    let path = "/viewHistory/paging".to_string();
    if let Some(failure) = state.record(Method::GET, path, query, &headers, Value::Null) {
        return failure;
    }

    let data = lock(&state.history).get(&user_id).cloned().unwrap_or_default();
    let total = data.len();
    Json(json!({ "data": data, "total": total })).into_response()
}

async fn record_view(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = "/viewHistory/user".to_string();
    if let Some(failure) = state.record(Method::POST, path, HashMap::new(), &headers, body) {
        return failure;
    }
    (StatusCode::CREATED, Json(json!({ "message": "ok" }))).into_response()
}

async fn suggestion(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let ids = query.get("ids").cloned().unwrap_or_default();
    let path = "/associationRules/suggestion".to_string();
    if let Some(failure) = state.record(Method::GET, path, query, &headers, Value::Null) {
        return failure;
    }

    // One suggestion per distinct queried id
    let mut seen = Vec::new();
    for id in ids.split(';').filter(|id| !id.is_empty()) {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    let products: Vec<Value> = seen
        .into_iter()
        .map(|id| json!({ "id": format!("rec-{id}"), "name": format!("Gợi ý {id}"), "price": 1000 }))
        .collect();
    Json(products).into_response()
}
