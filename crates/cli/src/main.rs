//! Tienda CLI - database migrations, catalog listing, and scripted checkout.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! tienda migrate
//!
//! # Check database connectivity
//! tienda db check
//!
//! # List the catalog served by the storefront backend
//! tienda products
//!
//! # Buy two products with a Stripe test card
//! tienda buy -p 1 -p 3 --name "Ana López" --card 4242424242424242 \
//!     --exp-month 12 --exp-year 2030 --cvc 123
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tienda")]
#[command(author, version, about = "Tienda CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Database utilities
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// List the catalog served by the storefront backend
    Products,
    /// Buy products: fills a cart, pays, and saves `receipt.xml`
    Buy {
        /// Product id to add to the cart (repeat for more entries)
        #[arg(short, long = "product", required = true)]
        products: Vec<i32>,

        /// Name on the card
        #[arg(short, long)]
        name: String,

        /// Card number
        #[arg(long)]
        card: String,

        /// Card expiry month (1-12)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        exp_month: u8,

        /// Card expiry year (four digits)
        #[arg(long)]
        exp_year: u16,

        /// Card verification code
        #[arg(long)]
        cvc: String,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check that the storefront database is reachable
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Db { action } => match action {
            DbAction::Check => commands::db::check().await?,
        },
        Commands::Products => commands::products::list().await?,
        Commands::Buy {
            products,
            name,
            card,
            exp_month,
            exp_year,
            cvc,
        } => {
            let card = tienda_checkout::CardDetails::new(card, exp_month, exp_year, cvc);
            commands::buy::run(&products, &name, &card).await?;
        }
    }
    Ok(())
}
