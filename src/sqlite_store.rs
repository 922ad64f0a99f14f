//! SQLite-backed [`TallyStore`] implementation.
//!
//! Each upsert is a single `INSERT … ON CONFLICT(source, external_id) DO
//! UPDATE` statement. Counter increments are expressed in SQL
//! (`likes = characters.likes + 1`), so concurrent votes on one key are
//! serialized by SQLite and none are lost.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use character_tally_core::models::{
    CharacterRecord, ListQuery, SortField, SortOrder, Vote, VoteRequest,
};
use character_tally_core::store::TallyStore;
use character_tally_core::{Character, Source};

const COLUMNS: &str =
    "id, source, external_id, name, image_url, likes, dislikes, last_evaluated_at, created_at";

const SEEN_UPSERT: &str = r#"
    INSERT INTO characters (id, source, external_id, name, image_url,
                            likes, dislikes, last_evaluated_at, created_at)
    VALUES (?, ?, ?, ?, ?, 0, 0, NULL, ?)
    ON CONFLICT(source, external_id) DO UPDATE SET
        name = excluded.name,
        image_url = excluded.image_url
"#;

const LIKE_UPSERT: &str = r#"
    INSERT INTO characters (id, source, external_id, name, image_url,
                            likes, dislikes, last_evaluated_at, created_at)
    VALUES (?, ?, ?, ?, ?, 1, 0, ?, ?)
    ON CONFLICT(source, external_id) DO UPDATE SET
        name = excluded.name,
        image_url = excluded.image_url,
        last_evaluated_at = excluded.last_evaluated_at,
        likes = characters.likes + 1
"#;

const DISLIKE_UPSERT: &str = r#"
    INSERT INTO characters (id, source, external_id, name, image_url,
                            likes, dislikes, last_evaluated_at, created_at)
    VALUES (?, ?, ?, ?, ?, 0, 1, ?, ?)
    ON CONFLICT(source, external_id) DO UPDATE SET
        name = excluded.name,
        image_url = excluded.image_url,
        last_evaluated_at = excluded.last_evaluated_at,
        dislikes = characters.dislikes + 1
"#;

/// SQLite implementation of the [`TallyStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Whitelisted column for a sort field; never interpolate user input.
fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Likes => "likes",
        SortField::Dislikes => "dislikes",
        SortField::LastEvaluatedAt => "last_evaluated_at",
        SortField::CreatedAt => "created_at",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {}", ms))
}

fn record_from_row(row: &SqliteRow) -> Result<CharacterRecord> {
    let source: String = row.get("source");
    let last_evaluated_at: Option<i64> = row.get("last_evaluated_at");
    let created_at: i64 = row.get("created_at");

    Ok(CharacterRecord {
        id: row.get("id"),
        source: source.parse::<Source>()?,
        external_id: row.get("external_id"),
        name: row.get("name"),
        image_url: row.get("image_url"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        last_evaluated_at: last_evaluated_at.map(from_millis).transpose()?,
        created_at: from_millis(created_at)?,
    })
}

#[async_trait]
impl TallyStore for SqliteStore {
    async fn record_seen(&self, character: &Character, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(SEEN_UPSERT)
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(character.source.as_str())
            .bind(&character.source_id)
            .bind(&character.name)
            .bind(&character.image)
            .bind(at.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_vote(&self, vote: &VoteRequest, at: DateTime<Utc>) -> Result<()> {
        let sql = match vote.vote {
            Vote::Like => LIKE_UPSERT,
            Vote::Dislike => DISLIKE_UPSERT,
        };
        let ts = at.timestamp_millis();
        sqlx::query(sql)
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(vote.source.as_str())
            .bind(&vote.source_id)
            .bind(&vote.name)
            .bind(&vote.image)
            .bind(ts)
            .bind(ts)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<(Vec<CharacterRecord>, i64)> {
        let source = query.source.map(|s| s.as_str());

        let sql = format!(
            "SELECT {} FROM characters WHERE (? IS NULL OR source = ?) \
             ORDER BY {} {}, rowid ASC LIMIT ? OFFSET ?",
            COLUMNS,
            sort_column(query.sort_by),
            sort_direction(query.order),
        );
        let rows = sqlx::query(&sql)
            .bind(source)
            .bind(source)
            .bind(query.limit)
            .bind(query.skip)
            .fetch_all(&self.pool)
            .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM characters WHERE (? IS NULL OR source = ?)")
                .bind(source)
                .bind(source)
                .fetch_one(&self.pool)
                .await?;

        let items = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn find_top(&self, field: SortField) -> Result<Option<CharacterRecord>> {
        let sql = format!(
            "SELECT {} FROM characters ORDER BY {} DESC, rowid ASC LIMIT 1",
            COLUMNS,
            sort_column(field),
        );
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn get(&self, source: Source, external_id: &str) -> Result<Option<CharacterRecord>> {
        let sql = format!(
            "SELECT {} FROM characters WHERE source = ? AND external_id = ?",
            COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(source.as_str())
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }
}
