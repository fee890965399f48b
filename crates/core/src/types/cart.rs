//! Cart line type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::line_total;
use super::product::ProductSnapshot;

/// One product in a cart, with its quantity.
///
/// On the wire the product id is serialized as `id` (the shape the remote
/// `users` resource and the local `cart` snapshot both use); `productId` is
/// accepted when reading.
///
/// `amount` is signed: decrementing can drive a retained line to zero or
/// below, and such snapshots must still round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "id", alias = "productId")]
    pub product_id: ProductId,
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub category_name: String,
    pub amount: i64,
}

impl CartLine {
    /// Build a cart line for `amount` units of a product.
    #[must_use]
    pub fn from_product(product: &ProductSnapshot, amount: i64) -> Self {
        Self {
            product_id: product.id.clone(),
            code: product.code.clone(),
            name: product.name.clone(),
            image: product.image.clone(),
            price: product.price,
            unit: product.unit.clone(),
            category_id: product
                .category_id
                .clone()
                .or_else(|| product.category.as_ref().map(|c| c.id.clone())),
            category_name: product
                .category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            amount,
        }
    }

    /// Price of this line (`price × amount`).
    #[must_use]
    pub fn total(&self) -> Decimal {
        line_total(self.price, self.amount)
    }
}
