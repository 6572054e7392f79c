//! Atiga Meubel CLI - database migrations and catalog management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! atiga migrate
//!
//! # Insert the sample catalog (optionally wiping existing products first)
//! atiga seed --clear
//!
//! # List products
//! atiga products list --limit 20
//!
//! # Hash a password for ADMIN_PASSWORD_HASH (reads stdin when --password is omitted)
//! atiga admin hash-password
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "atiga")]
#[command(author, version, about = "Atiga Meubel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert the sample product catalog
    Seed {
        /// Delete every existing product first
        #[arg(long)]
        clear: bool,
    },
    /// Inspect the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Admin account helpers
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, newest first
    List {
        /// Maximum number of products to show
        #[arg(short, long, default_value_t = 50)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Hash a password for the `ADMIN_PASSWORD_HASH` variable
    HashPassword {
        /// Password to hash (prompted on stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { clear } => commands::seed::run(clear).await?,
        Commands::Products { action } => match action {
            ProductsAction::List { limit } => commands::products::list(limit).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::HashPassword { password } => {
                commands::admin::hash_password(password)?;
            }
        },
    }
    Ok(())
}
