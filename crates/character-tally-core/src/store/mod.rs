//! Storage abstraction for Character Tally.
//!
//! The [`TallyStore`] trait defines every storage operation the character
//! service needs, enabling pluggable backends (SQLite, in-memory).
//!
//! Both write operations are upserts keyed on `(source, external_id)` and
//! must be atomic at the storage layer: a single conditional write, never a
//! read followed by a write. Concurrent votes on one key must not lose
//! increments.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Character, CharacterRecord, ListQuery, SortField, Source, VoteRequest};

/// Abstract tally storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`record_seen`](TallyStore::record_seen) | Upsert after a fetch; counters untouched |
/// | [`record_vote`](TallyStore::record_vote) | Upsert with an atomic counter increment |
/// | [`list`](TallyStore::list) | Filtered, sorted, paginated find with total count |
/// | [`find_top`](TallyStore::find_top) | Single record, descending by a field |
/// | [`get`](TallyStore::get) | Point lookup by key |
#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Insert with zeroed counters, or refresh name and image only.
    ///
    /// Never touches `likes`, `dislikes` or `last_evaluated_at` of an
    /// existing record.
    async fn record_seen(&self, character: &Character, at: DateTime<Utc>) -> Result<()>;

    /// Set name, image and `last_evaluated_at = at`, and increment exactly
    /// one counter. A first vote creates the record with that counter at 1
    /// and the other at 0.
    async fn record_vote(&self, vote: &VoteRequest, at: DateTime<Utc>) -> Result<()>;

    /// Return one page of records plus the total number matching the filter.
    async fn list(&self, query: &ListQuery) -> Result<(Vec<CharacterRecord>, i64)>;

    /// The first record when sorted descending by `field`, if any.
    async fn find_top(&self, field: SortField) -> Result<Option<CharacterRecord>>;

    async fn get(&self, source: Source, external_id: &str) -> Result<Option<CharacterRecord>>;
}
