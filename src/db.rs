//! Connection pool setup and helpers for classifying Postgres constraint errors.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Opens the pool and brings the schema up to date.
pub async fn connect(config: &Config) -> Result<PgPool, DatabaseError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    log::info!(
        "database pool opened (max {} connections)",
        config.database_max_connections
    );

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    log::info!("database migrations complete");
    Ok(())
}

/// The kind of integrity violation a statement ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Unique,
    ForeignKey,
}

/// Returns the violation kind and constraint name when `error` is a unique or
/// foreign-key violation, `None` for anything else.
pub fn violation(error: &sqlx::Error) -> Option<(Violation, String)> {
    let db_error = match error {
        sqlx::Error::Database(db_error) => db_error,
        _ => return None,
    };
    let constraint = db_error.constraint().unwrap_or_default().to_string();

    if db_error.is_unique_violation() {
        Some((Violation::Unique, constraint))
    } else if db_error.is_foreign_key_violation() {
        Some((Violation::ForeignKey, constraint))
    } else {
        None
    }
}

pub fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    matches!(violation(error), Some((Violation::Unique, name)) if name == constraint)
}

pub fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(violation(error), Some((Violation::ForeignKey, _)))
}
