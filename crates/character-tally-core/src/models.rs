//! Core data models used throughout Character Tally.
//!
//! [`CharacterRecord`] is what the store persists; [`Character`] is the
//! normalized shape adapters produce; [`CharacterListItem`] is the read
//! projection served by list and "top" queries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TallyError;

/// Default page size for [`ListQuery`].
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 100;

/// One external character catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    RickAndMorty,
    Pokemon,
    Superhero,
    DragonBall,
}

impl Source {
    /// Every known source, in registration order.
    pub const ALL: [Source; 4] = [
        Source::RickAndMorty,
        Source::Pokemon,
        Source::Superhero,
        Source::DragonBall,
    ];

    /// Wire name, as stored and as accepted in requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::RickAndMorty => "rickandmorty",
            Source::Pokemon => "pokemon",
            Source::Superhero => "superhero",
            Source::DragonBall => "dragonball",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| TallyError::InvalidSource(s.to_string()))
    }
}

/// Polarity of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Like,
    Dislike,
}

impl FromStr for Vote {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Vote::Like),
            "dislike" => Ok(Vote::Dislike),
            other => Err(TallyError::InvalidInput(format!(
                "vote must be 'like' or 'dislike', got '{}'",
                other
            ))),
        }
    }
}

/// Normalized character returned by adapters and by `random`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub source: Source,
    pub source_id: String,
    pub name: String,
    pub image: String,
}

/// Persisted tally record, unique on `(source, external_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    pub id: String,
    pub source: Source,
    pub external_id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub likes: i64,
    pub dislikes: i64,
    pub last_evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Read projection of a [`CharacterRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterListItem {
    pub source: Source,
    pub source_id: String,
    pub name: String,
    pub image: String,
    pub likes: i64,
    pub dislikes: i64,
    pub last_evaluated_at: Option<String>,
    pub created_at: Option<String>,
}

impl From<&CharacterRecord> for CharacterListItem {
    fn from(record: &CharacterRecord) -> Self {
        Self {
            source: record.source,
            source_id: record.external_id.clone(),
            name: record.name.clone(),
            image: record.image_url.clone().unwrap_or_default(),
            likes: record.likes,
            dislikes: record.dislikes,
            last_evaluated_at: record.last_evaluated_at.map(format_ts_iso),
            created_at: Some(format_ts_iso(record.created_at)),
        }
    }
}

/// A like/dislike submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub source: Source,
    pub source_id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub vote: Vote,
}

impl VoteRequest {
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.source_id.trim().is_empty() {
            return Err(TallyError::InvalidInput("sourceId must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(TallyError::InvalidInput("name must not be empty".into()));
        }
        Ok(())
    }
}

/// Acknowledgement returned after a vote is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAck {
    pub ok: bool,
}

/// Field a list or "top" query orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Likes,
    Dislikes,
    LastEvaluatedAt,
    #[default]
    CreatedAt,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Likes => "likes",
            SortField::Dislikes => "dislikes",
            SortField::LastEvaluatedAt => "lastEvaluatedAt",
            SortField::CreatedAt => "createdAt",
        }
    }
}

impl FromStr for SortField {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "likes" => Ok(SortField::Likes),
            "dislikes" => Ok(SortField::Dislikes),
            "lastEvaluatedAt" => Ok(SortField::LastEvaluatedAt),
            "createdAt" => Ok(SortField::CreatedAt),
            other => Err(TallyError::InvalidInput(format!(
                "sortBy must be one of likes, dislikes, lastEvaluatedAt, createdAt; got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(TallyError::InvalidInput(format!(
                "order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// Filter, sort and page parameters for [`list`](crate::store::TallyStore::list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub source: Option<Source>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub skip: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            source: None,
            sort_by: SortField::default(),
            order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl ListQuery {
    pub fn validate(&self) -> Result<(), TallyError> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(TallyError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        if self.skip < 0 {
            return Err(TallyError::InvalidInput("skip must be >= 0".into()));
        }
        Ok(())
    }
}

/// One page of list results plus the total number of matching records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterPage {
    pub items: Vec<CharacterListItem>,
    pub total: i64,
    pub limit: i64,
    pub skip: i64,
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn format_ts_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
