//! View history and recommendation commands.
//!
//! # Usage
//!
//! ```bash
//! mart view p-123 -n "Trà xanh" -p 45000
//! mart history
//! mart suggest
//! ```

use mart_client::ViewHistorySnapshot;
use mart_core::{ProductSnapshot, format_money};

use super::{CliError, CliSession, ProductArgs};

/// Record a product view and print the resulting history.
///
/// # Errors
///
/// Returns an error if the product arguments are invalid or the signed-in
/// user's history cannot be fetched.
pub async fn view(session: &mut CliSession, product: &ProductArgs) -> Result<(), CliError> {
    let history = session.record_view(product.to_snapshot()?).await?;
    print_history(&history);
    Ok(())
}

/// Load and print the view history.
pub async fn show(session: &mut CliSession) {
    let history = session.load_view_history().await;
    print_history(&history);
}

/// Print products suggested for the current cart and view history.
///
/// # Errors
///
/// Returns an error if the recommendation request fails.
pub async fn suggest(session: &CliSession) -> Result<(), CliError> {
    let products = session.suggestions().await?;
    tracing::info!(count = products.len(), "Fetched suggestions");
    print_products("Suggested", &products);
    Ok(())
}

fn print_history(history: &ViewHistorySnapshot) {
    print_products("Recently viewed", &history.entries);
}

#[allow(clippy::print_stdout)]
fn print_products(title: &str, products: &[ProductSnapshot]) {
    println!("{title}:");
    if products.is_empty() {
        println!("  (none)");
        return;
    }
    for product in products {
        println!(
            "  {:<16} {:<32} {:>14}",
            product.id.as_str(),
            product.name,
            format_money(product.price)
        );
    }
}
