//! Batch import command.
//!
//! Loads the dataset document, sets up the error log, runs the pipeline and
//! always releases the database pool before reporting the outcome. With
//! `--dry-run` the same pipeline runs against the in-memory store, which
//! validates the dataset (including taxonomy and per-record fallbacks)
//! without touching `PostgreSQL`.

use secrecy::SecretString;
use tracing::info;

use dalil_importer::store::{MemoryStore, PgStore, postgres};
use dalil_importer::{Dataset, ErrorLog, pipeline};

/// Run the import pipeline.
///
/// # Errors
///
/// Returns an error if the dataset cannot be loaded, the error log cannot
/// be initialized, the database is unreachable, or the taxonomy bootstrap
/// fails. Per-record failures are absorbed into the final counters instead.
pub async fn run(
    input: &str,
    log_file: &str,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let dataset = Dataset::load(input).await?;
    info!(path = %input, entries = dataset.entries.len(), "Loaded dataset");

    let error_log = ErrorLog::create(log_file)?;
    info!(path = %error_log.path().display(), "Errors will be logged");

    if dry_run {
        info!("Dry run: importing into an in-memory store");
        let store = MemoryStore::new();
        pipeline::run(&store, &dataset, &error_log).await?;
        return Ok(());
    }

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    let pool = postgres::create_pool(&database_url).await?;
    info!("Connected to directory database");
    let store = PgStore::new(pool.clone());

    // Release the pool whatever the batch outcome.
    let result = pipeline::run(&store, &dataset, &error_log).await;
    info!("Disconnecting from database");
    pool.close().await;

    result?;
    Ok(())
}
