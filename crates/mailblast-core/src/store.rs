//! SQLite pool construction.
//!
//! Repositories share one pool so that dispatch can join messages against
//! campaigns and contacts; each repository creates its own tables when
//! attached.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::Result;

/// Opens (or creates) the database at the given path.
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn open(database_path: &str) -> Result<SqlitePool> {
    let url = format!("sqlite:{database_path}?mode=rwc");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;
    Ok(pool)
}

/// Opens an in-memory database for testing.
///
/// A single connection keeps every repository attached to the same
/// in-memory database.
///
/// # Errors
///
/// Returns an error if the database connection fails.
pub async fn in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
