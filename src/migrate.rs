//! Database schema migrations (idempotent).
//!
//! Creates the `characters` table and the indexes backing the "top" and
//! list queries. Safe to run on every start.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Connect to the configured database, migrate it and close the pool.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Timestamps are Unix milliseconds.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS characters (
            id TEXT PRIMARY KEY,
            source TEXT NOT NULL,
            external_id TEXT NOT NULL,
            name TEXT NOT NULL,
            image_url TEXT,
            likes INTEGER NOT NULL DEFAULT 0,
            dislikes INTEGER NOT NULL DEFAULT 0,
            last_evaluated_at INTEGER,
            created_at INTEGER NOT NULL,
            UNIQUE(source, external_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_characters_likes ON characters(likes DESC)",
        "CREATE INDEX IF NOT EXISTS idx_characters_dislikes ON characters(dislikes DESC)",
        "CREATE INDEX IF NOT EXISTS idx_characters_last_evaluated ON characters(last_evaluated_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_characters_source_name ON characters(source, name)",
    ];
    for ddl in indexes {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(())
}
