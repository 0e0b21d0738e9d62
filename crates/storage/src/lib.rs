//! Storage layer: SQLite selection history and feedback.
//!
//! Holds DB pool setup and migration runner.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub mod history;
pub mod models;

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}", norm);
        }
    }
    let opts = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let mut pool_opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        pool_opts = pool_opts.max_connections(1);
    } else {
        pool_opts = pool_opts.max_connections(5);
    }
    let pool = pool_opts.connect_with(opts).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    // Applies SQLx migrations located in crates/storage/migrations.
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connect and bring the schema up to date.
pub async fn open(database_url: &str) -> anyhow::Result<SqlitePool> {
    let pool = connect(database_url).await?;
    migrate(&pool).await?;
    Ok(pool)
}
