//! Response envelopes of the remote API.

use serde::{Deserialize, Serialize};

use super::cart::CartLine;
use super::id::UserId;
use super::product::ProductSnapshot;

/// A page of results from a `*/paging` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingResult<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

/// One row of a user's view history, with the viewed product embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewHistoryRecord {
    pub product: ProductSnapshot,
}

/// The subset of the `users` resource the client layer reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub cart: Vec<CartLine>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_view_history_page_ignores_extra_fields() {
        let json = r#"{
            "data": [
                {"id": "vh1", "userId": "u1", "productId": "p1",
                 "product": {"id": "p1", "name": "Tea", "price": 1000}}
            ],
            "total": 1
        }"#;
        let page: PagingResult<ViewHistoryRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].product.name, "Tea");
    }

    #[test]
    fn test_user_without_cart() {
        let user: UserRecord = serde_json::from_str(r#"{"id":"u1","email":"a@b.vn"}"#).unwrap();
        assert!(user.cart.is_empty());
    }
}
