//! Dalil CLI - Database migrations and batch import tools.
//!
//! # Usage
//!
//! ```bash
//! # Run directory database migrations
//! dalil migrate
//!
//! # Import a dataset
//! dalil import --input data.json
//!
//! # Validate a dataset without touching the database
//! dalil import --input data.json --dry-run
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `import` - Run the idempotent batch import pipeline

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dalil")]
#[command(author, version, about = "Dalil CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run directory database migrations
    Migrate,
    /// Import a JSON dataset into the directory
    Import {
        /// Path to the dataset JSON file
        #[arg(short, long)]
        input: String,

        /// Path of the error log file (truncated at start of each run)
        #[arg(long, default_value = "import-errors.log")]
        log_file: String,

        /// Run the full pipeline against an in-memory store instead of
        /// `PostgreSQL`
        #[arg(long)]
        dry_run: bool,
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
        Commands::Import {
            input,
            log_file,
            dry_run,
        } => commands::import::run(&input, &log_file, dry_run).await?,
    }
    Ok(())
}
