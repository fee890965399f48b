//! Integration tests for cart reconciliation against the remote API.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use mart_client::{ApiClient, DepletedLinePolicy, LocalStore, MemoryStore, Session};
use mart_core::{CartLine, ProductId, ProductSnapshot, UserId};
use mart_integration_tests::{FakeApi, TEST_TOKEN};
use rust_decimal::Decimal;
use serde_json::json;

fn line(id: &str, amount: i64) -> CartLine {
    let product = ProductSnapshot::new(id, format!("Product {id}")).with_price(Decimal::from(25_000));
    CartLine::from_product(&product, amount)
}

fn session(api: &FakeApi, policy: DepletedLinePolicy) -> Session<MemoryStore, ApiClient> {
    let client = ApiClient::new(&api.config()).expect("Failed to create API client");
    Session::new(MemoryStore::new(), Arc::new(client), policy)
}

fn amounts(api: &FakeApi, user_id: &UserId) -> Vec<(String, i64)> {
    let cart = api.cart(user_id).expect("No cart stored");
    cart.as_array()
        .expect("Cart is not an array")
        .iter()
        .map(|line| {
            (
                line["id"].as_str().unwrap_or_default().to_string(),
                line["amount"].as_i64().unwrap_or_default(),
            )
        })
        .collect()
}

// ============================================================================
// Push on mutation
// ============================================================================

#[tokio::test]
async fn test_signed_in_new_lines_push_full_cart() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    let mut session = session(&api, DepletedLinePolicy::Retain);
    session.sign_in(user.clone());

    session.add_to_cart(line("p1", 2));
    session.settle().await;
    session.add_to_cart(line("p2", 1));
    session.settle().await;

    let puts = api.requests_to(&Method::PUT, "/users/u1");
    assert_eq!(puts.len(), 2);
    let bearer = format!("Bearer {TEST_TOKEN}");
    assert!(puts.iter().all(|r| r.authorization.as_deref() == Some(bearer.as_str())));
    assert_eq!(
        amounts(&api, &user),
        vec![("p1".to_string(), 2), ("p2".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_merging_into_existing_line_does_not_push() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api, DepletedLinePolicy::Retain);
    session.sign_in(UserId::new("u1"));

    session.add_to_cart(line("p1", 1));
    session.settle().await;
    let snapshot = session.add_to_cart(line("p1", 3));
    session.settle().await;

    assert_eq!(snapshot.lines[0].amount, 4);
    assert_eq!(api.requests_to(&Method::PUT, "/users/u1").len(), 1);
}

#[tokio::test]
async fn test_anonymous_mutations_stay_local() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api, DepletedLinePolicy::Retain);

    session.add_to_cart(line("p1", 1));
    session.decrement(&ProductId::new("p1"), 1);
    session.settle().await;

    assert!(api.requests().is_empty());
    assert!(session.store().get("cart").is_some());
}

#[tokio::test]
async fn test_remove_and_decrement_push_new_cart() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    let mut session = session(&api, DepletedLinePolicy::Remove);
    session.sign_in(user.clone());

    session.add_to_cart(line("p1", 2));
    session.settle().await;
    session.add_to_cart(line("p2", 1));
    session.settle().await;
    session.decrement(&ProductId::new("p1"), 2);
    session.settle().await;

    assert_eq!(amounts(&api, &user), vec![("p2".to_string(), 1)]);

    session.remove_from_cart(&ProductId::new("p2"));
    session.settle().await;
    assert_eq!(amounts(&api, &user), Vec::<(String, i64)>::new());
}

#[tokio::test]
async fn test_push_failure_keeps_local_state() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    let mut session = session(&api, DepletedLinePolicy::Retain);
    session.sign_in(user.clone());
    api.fail_with(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "down" }));

    let snapshot = session.add_to_cart(line("p1", 4));
    session.settle().await;

    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(session.cart().item_count(), 4);
    assert!(api.cart(&user).is_none());
    assert_eq!(api.requests_to(&Method::PUT, "/users/u1").len(), 1);
}

#[tokio::test]
async fn test_clear_does_not_touch_server() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api, DepletedLinePolicy::Retain);
    session.sign_in(UserId::new("u1"));

    session.add_to_cart(line("p1", 1));
    session.settle().await;
    let before = api.requests().len();

    session.clear_cart();
    session.settle().await;

    assert_eq!(api.requests().len(), before);
    assert!(session.cart().lines.is_empty());
    assert!(session.store().get("cart").is_none());
}

// ============================================================================
// Session start
// ============================================================================

#[tokio::test]
async fn test_start_merges_server_and_local_carts() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let user = UserId::new("u1");
    api.seed_cart(&user, &[line("p1", 1), line("p2", 5)]);

    let mut session = session(&api, DepletedLinePolicy::Retain);
    // Anonymous browsing before sign-in leaves a local cart behind
    session.add_to_cart(line("p1", 9));
    session.add_to_cart(line("p3", 2));
    session.sign_in(user.clone());

    let snapshot = session.start().await;
    session.settle().await;

    let merged: Vec<(&str, i64)> = snapshot
        .lines
        .iter()
        .map(|l| (l.product_id.as_str(), l.amount))
        .collect();
    // Server membership wins; local amounts win for shared products
    assert_eq!(merged, vec![("p1", 9), ("p2", 5)]);
    assert!(snapshot.status.is_ready());
    assert_eq!(api.requests_to(&Method::GET, "/users/u1").len(), 1);
}

#[tokio::test]
async fn test_start_falls_back_to_local_when_server_fails() {
    let api = FakeApi::start().await.expect("Failed to start fake API");
    let mut session = session(&api, DepletedLinePolicy::Retain);
    session.add_to_cart(line("p1", 2));
    session.sign_in(UserId::new("u1"));
    api.fail_with(StatusCode::SERVICE_UNAVAILABLE, json!({}));

    let snapshot = session.start().await;

    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.lines[0].amount, 2);
}
