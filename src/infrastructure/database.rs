// SQL pool setup and schema
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS visualizations (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS insights (
        id TEXT PRIMARY KEY,
        visualization_id TEXT NOT NULL REFERENCES visualizations(id) ON DELETE CASCADE,
        summary TEXT NOT NULL,
        key_insights TEXT NOT NULL,
        recommendations TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_insights_visualization ON insights(visualization_id, created_at)",
];

pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url {}", url))?
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    migrate(&pool).await?;
    tracing::info!("Database ready at {}", url);
    Ok(pool)
}

pub async fn migrate(pool: &Pool<Sqlite>) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    Ok(())
}

/// Single-connection in-memory database for tests
#[cfg(test)]
pub async fn in_memory() -> Pool<Sqlite> {
    connect("sqlite::memory:", 1).await.unwrap()
}
