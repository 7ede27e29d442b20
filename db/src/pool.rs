//! Connection pool setup — initialized once at startup and shared
//! thereafter.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub type Pool = SqlitePool;

/// Connect to `database_url`, creating the database file if it does not
/// exist, and apply the schema.
pub async fn connect(database_url: &str) -> anyhow::Result<Pool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // An in-memory database is private to the connection that created it;
    // pooling more than one connection would give each caller a different,
    // empty database. Tests that pass "sqlite::memory:" get a single
    // connection so the whole suite shares one in-memory instance.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    crate::schema::init(&pool).await?;
    tracing::info!(database_url, "connected to database and applied schema");

    Ok(pool)
}
