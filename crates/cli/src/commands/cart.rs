//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! mart cart show
//! mart cart add p-123 -n "Trà xanh" -p 45000 -a 2
//! mart cart decrement p-123 -a 1
//! mart cart remove p-123
//! mart cart clear
//! ```
//!
//! Mutations are applied locally first. When `MART_USER_ID` is set the new
//! cart is also pushed to the server before the command exits.

use mart_client::CartSnapshot;
use mart_core::{CartLine, ProductId, format_money};

use super::{CliError, CliSession, ProductArgs};

/// Add `amount` units of a product.
///
/// # Errors
///
/// Returns an error if the product arguments are invalid.
pub fn add(session: &mut CliSession, product: &ProductArgs, amount: i64) -> Result<(), CliError> {
    let line = CartLine::from_product(&product.to_snapshot()?, amount);
    tracing::info!(product_id = %line.product_id, amount, "Adding to cart");
    show(&session.add_to_cart(line));
    Ok(())
}

/// Remove `amount` units of a product.
///
/// # Errors
///
/// Returns an error if the product id is blank.
pub fn decrement(session: &mut CliSession, id: &str, amount: i64) -> Result<(), CliError> {
    let product_id = parse_id(id)?;
    show(&session.decrement(&product_id, amount));
    Ok(())
}

/// Remove a product from the cart.
///
/// # Errors
///
/// Returns an error if the product id is blank.
pub fn remove(session: &mut CliSession, id: &str) -> Result<(), CliError> {
    let product_id = parse_id(id)?;
    show(&session.remove_from_cart(&product_id));
    Ok(())
}

/// Print the cart as a table.
#[allow(clippy::print_stdout)]
pub fn show(cart: &CartSnapshot) {
    if cart.lines.is_empty() {
        println!("Cart is empty");
        return;
    }

    println!("{:<16} {:<32} {:>6} {:>14}", "ID", "NAME", "QTY", "TOTAL");
    for line in cart.lines.iter() {
        println!(
            "{:<16} {:<32} {:>6} {:>14}",
            line.product_id.as_str(),
            line.name,
            line.amount,
            format_money(line.total())
        );
    }
    println!();
    println!(
        "{} item(s), subtotal {}",
        cart.item_count(),
        format_money(cart.subtotal())
    );
}

fn parse_id(id: &str) -> Result<ProductId, CliError> {
    ProductId::parse(id).map_err(|_| CliError::EmptyProductId)
}
