//! In-memory [`TallyStore`] implementation for tests and embedding.
//!
//! Records live in insertion order behind one `std::sync::RwLock`. Each
//! upsert runs entirely under the write lock, which makes it atomic with
//! respect to every other writer.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    Character, CharacterRecord, ListQuery, SortField, SortOrder, Source, Vote, VoteRequest,
};

use super::TallyStore;

#[derive(Default)]
struct Inner {
    records: Vec<CharacterRecord>,
    index: HashMap<(Source, String), usize>,
}

impl Inner {
    fn position(&self, source: Source, external_id: &str) -> Option<usize> {
        self.index.get(&(source, external_id.to_string())).copied()
    }

    fn insert(&mut self, record: CharacterRecord) {
        self.index.insert(
            (record.source, record.external_id.clone()),
            self.records.len(),
        );
        self.records.push(record);
    }
}

/// In-memory store; cheap to create, lost on drop.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

fn compare_by(field: SortField, a: &CharacterRecord, b: &CharacterRecord) -> Ordering {
    match field {
        SortField::Likes => a.likes.cmp(&b.likes),
        SortField::Dislikes => a.dislikes.cmp(&b.dislikes),
        // None sorts below any timestamp.
        SortField::LastEvaluatedAt => a.last_evaluated_at.cmp(&b.last_evaluated_at),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

fn sorted(records: &[CharacterRecord], field: SortField, order: SortOrder) -> Vec<&CharacterRecord> {
    let mut refs: Vec<&CharacterRecord> = records.iter().collect();
    // Stable sort keeps insertion order among ties.
    refs.sort_by(|a, b| match order {
        SortOrder::Asc => compare_by(field, a, b),
        SortOrder::Desc => compare_by(field, b, a),
    });
    refs
}

#[async_trait]
impl TallyStore for InMemoryStore {
    async fn record_seen(&self, character: &Character, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.write()?;
        match inner.position(character.source, &character.source_id) {
            Some(pos) => {
                let record = &mut inner.records[pos];
                record.name = character.name.clone();
                record.image_url = Some(character.image.clone());
            }
            None => inner.insert(CharacterRecord {
                id: uuid::Uuid::new_v4().to_string(),
                source: character.source,
                external_id: character.source_id.clone(),
                name: character.name.clone(),
                image_url: Some(character.image.clone()),
                likes: 0,
                dislikes: 0,
                last_evaluated_at: None,
                created_at: at,
            }),
        }
        Ok(())
    }

    async fn record_vote(&self, vote: &VoteRequest, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.write()?;
        let pos = match inner.position(vote.source, &vote.source_id) {
            Some(pos) => pos,
            None => {
                inner.insert(CharacterRecord {
                    id: uuid::Uuid::new_v4().to_string(),
                    source: vote.source,
                    external_id: vote.source_id.clone(),
                    name: vote.name.clone(),
                    image_url: Some(vote.image.clone()),
                    likes: 0,
                    dislikes: 0,
                    last_evaluated_at: None,
                    created_at: at,
                });
                inner.records.len() - 1
            }
        };
        let record = &mut inner.records[pos];
        record.name = vote.name.clone();
        record.image_url = Some(vote.image.clone());
        record.last_evaluated_at = Some(at);
        match vote.vote {
            Vote::Like => record.likes += 1,
            Vote::Dislike => record.dislikes += 1,
        }
        Ok(())
    }

    async fn list(&self, query: &ListQuery) -> Result<(Vec<CharacterRecord>, i64)> {
        let inner = self.read()?;
        let matching: Vec<CharacterRecord> = inner
            .records
            .iter()
            .filter(|r| query.source.map_or(true, |s| r.source == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page: Vec<CharacterRecord> = sorted(&matching, query.sort_by, query.order)
            .into_iter()
            .skip(query.skip.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find_top(&self, field: SortField) -> Result<Option<CharacterRecord>> {
        let inner = self.read()?;
        Ok(sorted(&inner.records, field, SortOrder::Desc)
            .first()
            .map(|r| (*r).clone()))
    }

    async fn get(&self, source: Source, external_id: &str) -> Result<Option<CharacterRecord>> {
        let inner = self.read()?;
        Ok(inner
            .position(source, external_id)
            .map(|pos| inner.records[pos].clone()))
    }
}
