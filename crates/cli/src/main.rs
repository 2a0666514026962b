//! Segishop CLI - Catalog and shipping operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Check an import file without touching the API
//! segishop products validate products.csv
//!
//! # Create every valid row
//! segishop products import products.csv
//!
//! # Dump the catalog in the import format
//! segishop products export -o products.csv
//!
//! # Assign a method to zones 3 and 4, or to every zone it is missing from
//! segishop shipping assign --method 2 --zone 3 --zone 4
//! segishop shipping assign --method 2 --all
//! ```
//!
//! # Environment Variables
//!
//! Commands that reach the API read `SEGISHOP_API_URL`,
//! `SEGISHOP_ADMIN_TOKEN` and `SEGISHOP_API_TIMEOUT_SECS`, like the admin
//! console.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use segishop_core::types::{MethodId, ZoneId};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "segishop")]
#[command(author, version, about = "Segishop operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Product catalog CSV tools
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Shipping configuration tools
    Shipping {
        #[command(subcommand)]
        action: ShippingAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Validate an import file and list row errors
    Validate {
        /// CSV file to check
        file: PathBuf,
    },
    /// Create a product for every valid row
    Import {
        /// CSV file to import
        file: PathBuf,
    },
    /// Export every product in the import format
    Export {
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an import template with one example row
    Template {
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ShippingAction {
    /// Show configuration counters
    Overview,
    /// Assign a method to zones
    Assign {
        /// Shipping method id
        #[arg(short, long)]
        method: MethodId,

        /// Zone ids; repeat the flag for several
        #[arg(short, long = "zone", required_unless_present = "all")]
        zones: Vec<ZoneId>,

        /// Every zone the method is not yet in
        #[arg(long, conflicts_with = "zones")]
        all: bool,
    },
    /// Remove a method from zones
    Remove {
        /// Shipping method id
        #[arg(short, long)]
        method: MethodId,

        /// Zone ids; repeat the flag for several
        #[arg(short, long = "zone", required_unless_present = "all")]
        zones: Vec<ZoneId>,

        /// Every zone the method is in
        #[arg(long, conflicts_with = "zones")]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "segishop=info,segishop_admin=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductsAction::Validate { file } => commands::products::validate(&file)?,
            ProductsAction::Import { file } => commands::products::import(&file).await?,
            ProductsAction::Export { output } => {
                commands::products::export(output.as_deref()).await?;
            }
            ProductsAction::Template { output } => {
                commands::products::template(output.as_deref())?;
            }
        },
        Commands::Shipping { action } => match action {
            ShippingAction::Overview => commands::shipping::overview().await?,
            ShippingAction::Assign { method, zones, all } => {
                commands::shipping::assign(method, &zones, all).await?;
            }
            ShippingAction::Remove { method, zones, all } => {
                commands::shipping::remove(method, &zones, all).await?;
            }
        },
    }
    Ok(())
}
