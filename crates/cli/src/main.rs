//! Mart CLI - drive the client layer from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the reconciled cart
//! mart cart show
//!
//! # Add two units of a product
//! mart cart add p-123 --name "Trà xanh" --price 45000 --amount 2
//!
//! # Record a product view and print the recent-views rail
//! mart view p-123 --name "Trà xanh" --price 45000
//!
//! # Ask for suggestions based on cart + view history
//! mart suggest
//!
//! # Validate a JSON record against a JSON rule list
//! mart validate --rules rules.json --data form.json
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and mutate the cart
//! - `view` / `history` - Record views, show the view history
//! - `suggest` - Query the recommendation service
//! - `validate` - Run the validation engine (no configuration needed)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "mart")]
#[command(author, version, about = "Mart storefront client tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and mutate the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Record a product view
    View {
        #[command(flatten)]
        product: commands::ProductArgs,
    },
    /// Show the recently viewed products
    History,
    /// Show products suggested for the cart and view history
    Suggest,
    /// Validate a JSON record against a JSON rule list
    Validate {
        /// Rule list file
        #[arg(short, long)]
        rules: PathBuf,

        /// Record file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Reconcile and print the cart
    Show,
    /// Add units of a product
    Add {
        #[command(flatten)]
        product: commands::ProductArgs,

        /// Units to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        amount: i64,
    },
    /// Remove units of a product
    Decrement {
        /// Product id
        id: String,

        /// Units to remove
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        amount: i64,
    },
    /// Remove a product entirely
    Remove {
        /// Product id
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mart_client=info,mart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Validate { rules, data } = &cli.command {
        commands::validate::run(rules, data)?;
        return Ok(());
    }
    run_session(cli.command).await?;
    Ok(())
}

async fn run_session(command: Commands) -> Result<(), commands::CliError> {
    let mut session = commands::open_session()?;

    match command {
        Commands::Cart { action } => {
            session.start().await;
            match action {
                CartAction::Show => commands::cart::show(&session.cart()),
                CartAction::Add { product, amount } => {
                    commands::cart::add(&mut session, &product, amount)?;
                }
                CartAction::Decrement { id, amount } => {
                    commands::cart::decrement(&mut session, &id, amount)?;
                }
                CartAction::Remove { id } => commands::cart::remove(&mut session, &id)?,
                CartAction::Clear => commands::cart::show(&session.clear_cart()),
            }
        }
        Commands::View { product } => commands::history::view(&mut session, &product).await?,
        Commands::History => commands::history::show(&mut session).await,
        Commands::Suggest => {
            session.start().await;
            commands::history::show(&mut session).await;
            commands::history::suggest(&session).await?;
        }
        Commands::Validate { .. } => {}
    }

    // Let best-effort pushes finish before the process exits
    session.settle().await;
    Ok(())
}
