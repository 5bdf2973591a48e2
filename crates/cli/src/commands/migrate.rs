//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! lpg migrate
//! lpg migrate --database-url postgres://localhost/lpg
//! ```
//!
//! # Environment Variables
//!
//! - `LPG_DATABASE_URL` - `PostgreSQL` connection string
//! - `DATABASE_URL` - Fallback when `LPG_DATABASE_URL` is unset
//!
//! Migrations are embedded from `crates/server/migrations/` at compile time.

use sqlx::PgPool;
use thiserror::Error;

/// Errors raised while applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations to the key-value database.
///
/// # Errors
///
/// Returns an error if no connection string is configured, the database is
/// unreachable, or a migration fails.
pub async fn run(database_url: Option<String>) -> Result<(), MigrationError> {
    let database_url = database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or(MigrationError::MissingEnvVar("LPG_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    pool.close().await;
    Ok(())
}
