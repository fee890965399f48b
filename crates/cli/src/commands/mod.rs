//! Subcommand implementations.

pub mod cart;
pub mod history;
pub mod validate;

use std::sync::Arc;

use clap::Args;
use mart_client::{ApiClient, ApiError, ClientConfig, ConfigError, FileStore, Session, StoreError};
use mart_core::ProductSnapshot;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors shared by the session-backed commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local store could not be opened.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Product id was blank.
    #[error("Product id must not be empty")]
    EmptyProductId,
}

/// Product fields accepted by `cart add` and `view`.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Product id
    pub id: String,

    /// Display name
    #[arg(short, long)]
    pub name: String,

    /// Unit price
    #[arg(short, long, default_value_t = Decimal::ZERO)]
    pub price: Decimal,

    /// Product code
    #[arg(long, default_value = "")]
    pub code: String,

    /// Unit label
    #[arg(long, default_value = "")]
    pub unit: String,

    /// Image URL
    #[arg(long, default_value = "")]
    pub image: String,
}

impl ProductArgs {
    /// Build the product snapshot these arguments describe.
    ///
    /// # Errors
    ///
    /// Returns `CliError::EmptyProductId` if the id is blank.
    pub fn to_snapshot(&self) -> Result<ProductSnapshot, CliError> {
        if self.id.trim().is_empty() {
            return Err(CliError::EmptyProductId);
        }
        let mut product = ProductSnapshot::new(self.id.trim(), self.name.as_str()).with_price(self.price);
        product.code.clone_from(&self.code);
        product.unit.clone_from(&self.unit);
        product.image.clone_from(&self.image);
        Ok(product)
    }
}

/// Session type driven by the CLI.
pub type CliSession = Session<FileStore, ApiClient>;

/// Build a session from environment configuration.
///
/// # Errors
///
/// Returns an error if configuration is missing, the store directory cannot
/// be created, or the HTTP client cannot be built.
pub fn open_session() -> Result<CliSession, CliError> {
    let config = ClientConfig::from_env()?;
    let store = FileStore::open(&config.store_dir)?;
    let remote = Arc::new(ApiClient::new(&config.api)?);

    let mut session = Session::new(store, remote, config.cart_policy);
    if let Some(user_id) = config.user_id {
        session.sign_in(user_id);
    }
    tracing::debug!(store_dir = %config.store_dir.display(), "Session opened");
    Ok(session)
}
