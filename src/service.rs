//! The character service: source selection, fetch, and tally bookkeeping.
//!
//! [`CharacterService`] is the single entry point used by both the CLI and
//! the HTTP server. It owns the [`AdapterRegistry`] and a shared
//! [`TallyStore`].
//!
//! # Random fetch
//!
//! 1. Compute the available sources (adapters reporting `Ready`).
//! 2. An explicit source must be available; a registered but unconfigured
//!    one is [`TallyError::Misconfigured`], anything else
//!    [`TallyError::InvalidSource`].
//! 3. Without a source, pick uniformly among the available ones.
//! 4. Fetch through the adapter, then record a seen-upsert. Storage errors
//!    propagate as [`TallyError::Storage`].

use std::sync::Arc;

use chrono::Utc;

use character_tally_core::cache::CountCache;
use character_tally_core::models::{
    CharacterListItem, CharacterPage, ListQuery, SortField, VoteAck, VoteRequest,
};
use character_tally_core::random::pick;
use character_tally_core::store::TallyStore;
use character_tally_core::{Character, Source, TallyError};

use crate::adapter_dragonball::DragonBallAdapter;
use crate::adapter_pokemon::PokemonAdapter;
use crate::adapter_rickandmorty::RickAndMortyAdapter;
use crate::adapter_superhero::SuperheroAdapter;
use crate::config::Config;
use crate::traits::{AdapterRegistry, Availability};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Build the registry of built-in adapters sharing one transport and one
/// count cache.
pub fn builtin_adapters(
    config: &Config,
    transport: Arc<dyn HttpTransport>,
    counts: Arc<CountCache>,
) -> AdapterRegistry {
    let sources = &config.sources;
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(RickAndMortyAdapter::new(
        &sources.rickandmorty,
        transport.clone(),
        counts.clone(),
    )));
    registry.register(Box::new(PokemonAdapter::new(
        &sources.pokemon,
        transport.clone(),
        counts,
    )));
    registry.register(Box::new(DragonBallAdapter::new(
        &sources.dragonball,
        transport.clone(),
    )));
    registry.register(Box::new(SuperheroAdapter::new(&sources.superhero, transport)));
    registry
}

pub struct CharacterService {
    adapters: AdapterRegistry,
    store: Arc<dyn TallyStore>,
}

impl CharacterService {
    pub fn new(adapters: AdapterRegistry, store: Arc<dyn TallyStore>) -> Self {
        Self { adapters, store }
    }

    /// Wire the built-in adapters over `reqwest` with a fresh count cache.
    pub fn from_config(config: &Config, store: Arc<dyn TallyStore>) -> anyhow::Result<Self> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestTransport::new(config.http.timeout())?);
        let counts = Arc::new(CountCache::new(config.cache.count_ttl()));
        Ok(Self::new(builtin_adapters(config, transport, counts), store))
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    pub fn available_sources(&self) -> Vec<Source> {
        self.adapters.available_sources()
    }

    /// Fetch a random character, optionally from a named source, and record
    /// it as seen.
    pub async fn get_random_character(
        &self,
        source: Option<Source>,
    ) -> Result<Character, TallyError> {
        let available = self.available_sources();

        let chosen = match source {
            Some(requested) => {
                if !available.contains(&requested) {
                    return Err(self.unavailable(requested));
                }
                requested
            }
            None => *pick(&mut rand::rng(), &available).ok_or(TallyError::NoSourcesAvailable)?,
        };
        tracing::debug!(source = %chosen, explicit = source.is_some(), "source selected");

        let adapter = self
            .adapters
            .find(chosen)
            .ok_or_else(|| TallyError::InvalidSource(chosen.to_string()))?;
        let character = adapter.fetch_random().await?;

        self.store
            .record_seen(&character, Utc::now())
            .await
            .map_err(TallyError::Storage)?;

        Ok(character)
    }

    fn unavailable(&self, requested: Source) -> TallyError {
        match self.adapters.find(requested).map(|a| a.availability()) {
            Some(Availability::Misconfigured(reason)) => TallyError::Misconfigured {
                catalog: requested,
                reason,
            },
            _ => TallyError::InvalidSource(requested.to_string()),
        }
    }

    pub async fn record_vote(&self, vote: &VoteRequest) -> Result<VoteAck, TallyError> {
        vote.validate()?;
        self.store
            .record_vote(vote, Utc::now())
            .await
            .map_err(TallyError::Storage)?;
        tracing::info!(
            source = %vote.source,
            source_id = %vote.source_id,
            vote = ?vote.vote,
            "vote recorded"
        );
        Ok(VoteAck { ok: true })
    }

    pub async fn list_characters(&self, query: &ListQuery) -> Result<CharacterPage, TallyError> {
        query.validate()?;
        let (records, total) = self.store.list(query).await.map_err(TallyError::Storage)?;
        Ok(CharacterPage {
            items: records.iter().map(CharacterListItem::from).collect(),
            total,
            limit: query.limit,
            skip: query.skip,
        })
    }

    pub async fn top_liked(&self) -> Result<Option<CharacterListItem>, TallyError> {
        self.top_by(SortField::Likes).await
    }

    pub async fn top_disliked(&self) -> Result<Option<CharacterListItem>, TallyError> {
        self.top_by(SortField::Dislikes).await
    }

    pub async fn last_evaluated(&self) -> Result<Option<CharacterListItem>, TallyError> {
        self.top_by(SortField::LastEvaluatedAt).await
    }

    async fn top_by(&self, field: SortField) -> Result<Option<CharacterListItem>, TallyError> {
        let record = self
            .store
            .find_top(field)
            .await
            .map_err(TallyError::Storage)?;
        Ok(record.as_ref().map(CharacterListItem::from))
    }
}
