// Account storage. Nothing in the recipe search path touches this module.

pub mod models;
pub mod users;

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

pub type DbPool = Pool<Sqlite>;

/// Initialize database connection pool, creating the SQLite file if needed
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    // Create data directory if it doesn't exist
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        if !path.starts_with(':') {
            if let Some(parent) = Path::new(path.trim_start_matches("//")).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Initialize the pool from settings and make sure the users table exists
pub async fn init_pool_with_config(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = init_pool(&config.url, config.max_connections).await?;
    users::create_table(&pool).await?;
    Ok(pool)
}
