//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! dalil migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string for the directory
//!
//! Migration files live in `crates/importer/migrations/`.

use secrecy::SecretString;
use tracing::info;

use dalil_importer::store::postgres;

/// Run directory database migrations.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the connection fails, or
/// a migration fails to apply.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| "DATABASE_URL not set")?;

    info!("Connecting to directory database");
    let pool = postgres::create_pool(&database_url).await?;

    info!("Running directory migrations");
    sqlx::migrate!("../importer/migrations").run(&pool).await?;

    pool.close().await;
    info!("Directory migrations complete!");
    Ok(())
}
