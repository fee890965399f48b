//! Integration tests for view history against the remote API.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use mart_client::{ApiClient, ApiError, DepletedLinePolicy, MemoryStore, Session};
use mart_core::{ProductId, ProductSnapshot, UserId};
use mart_integration_tests::FakeApi;
use rust_decimal::Decimal;
use serde_json::json;

fn product(id: &str) -> ProductSnapshot {
    ProductSnapshot::new(id, format!("Product {id}")).with_price(Decimal::from(12_000))
}

fn session(api: &FakeApi) -> Session<MemoryStore, ApiClient> {
    let client = ApiClient::new(&api.config()).expect("Failed to create API client");
    Session::new(
        MemoryStore::new(),
        Arc::new(client),
        DepletedLinePolicy::Retain,
    )
}

fn ids(ordered: &[ProductId]) -> Vec<&str> {
    ordered.iter().map(ProductId::as_str).collect()
}

#[tokio::test]
async fn test_signed_in_view_fetches_history_and_records() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    api.seed_history(&user, &[product("a"), product("b")]);

    let mut session = session(&api);
    session.sign_in(user);

    let history = session.record_view(product("c")).await.expect("View failed");
    session.settle().await;

    assert_eq!(ids(&history.ordered_ids), vec!["a", "b", "c"]);

    let paging = api.requests_to(&Method::GET, "/viewHistory/paging");
    assert_eq!(paging.len(), 1);
    assert_eq!(paging[0].query.get("userId").map(String::as_str), Some("u1"));

    let posts = api.requests_to(&Method::POST, "/viewHistory/user");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].body, json!({ "productId": "c" }));
}

#[tokio::test]
async fn test_already_viewed_product_is_not_recorded_again() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    api.seed_history(&user, &[product("a"), product("b")]);

    let mut session = session(&api);
    session.sign_in(user);

    let history = session.record_view(product("a")).await.expect("View failed");
    session.settle().await;

    assert_eq!(ids(&history.ordered_ids), vec!["a", "b"]);
    assert!(api.requests_to(&Method::POST, "/viewHistory/user").is_empty());
}

#[tokio::test]
async fn test_history_is_bounded_to_four_newest() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    api.seed_history(
        &user,
        &[product("a"), product("b"), product("c"), product("d")],
    );

    let mut session = session(&api);
    session.sign_in(user);

    let history = session.record_view(product("e")).await.expect("View failed");
    assert_eq!(ids(&history.ordered_ids), vec!["b", "c", "d", "e"]);
    assert_eq!(history.entries.len(), 4);
}

#[tokio::test]
async fn test_anonymous_views_never_call_remote() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api);

    session.record_view(product("a")).await.expect("View failed");
    let history = session.record_view(product("b")).await.expect("View failed");
    session.settle().await;

    assert_eq!(ids(&history.ordered_ids), vec!["a", "b"]);
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_failed_fetch_resets_history() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api);
    session.record_view(product("a")).await.expect("View failed");
    session.sign_in(UserId::new("u1"));
    api.fail_with(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" }));

    let result = session.record_view(product("b")).await;

    assert!(matches!(result, Err(ApiError::Api { status: 500, .. })));
    assert!(session.view_history().ordered_ids.is_empty());
    assert!(api.requests_to(&Method::POST, "/viewHistory/user").is_empty());
}

#[tokio::test]
async fn test_load_view_history_uses_server_copy() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    api.seed_history(&user, &[product("x"), product("y")]);

    let mut session = session(&api);
    session.sign_in(user);

    let history = session.load_view_history().await;
    assert_eq!(ids(&history.ordered_ids), vec!["x", "y"]);
    assert!(history.status.is_ready());
}
