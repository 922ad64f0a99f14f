//! Rick and Morty API adapter.
//!
//! The catalog size is not fixed, so the id bound comes from the shared
//! [`CountCache`], refreshed from `GET {base}/character` (`info.count`).
//! Characters are read from `GET {base}/character/{id}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use character_tally_core::cache::CountCache;
use character_tally_core::{Character, Source, TallyError};

use crate::config::RickAndMortyConfig;
use crate::traits::{join_url, ExternalId, SourceAdapter};
use crate::transport::{fetch_json, HttpTransport};

#[derive(Debug, Deserialize)]
struct CharacterPage {
    info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawCharacter {
    id: ExternalId,
    name: String,
    image: Option<String>,
}

pub struct RickAndMortyAdapter {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    counts: Arc<CountCache>,
}

impl RickAndMortyAdapter {
    pub fn new(
        config: &RickAndMortyConfig,
        transport: Arc<dyn HttpTransport>,
        counts: Arc<CountCache>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            transport,
            counts,
        }
    }

    async fn fetch_count(&self) -> Result<u64, TallyError> {
        let url = join_url(&self.base_url, "character");
        let page: CharacterPage =
            fetch_json(self.transport.as_ref(), Source::RickAndMorty, &url, "character count")
                .await?;
        Ok(page.info.and_then(|info| info.count).unwrap_or(0))
    }
}

#[async_trait]
impl SourceAdapter for RickAndMortyAdapter {
    fn source(&self) -> Source {
        Source::RickAndMorty
    }

    fn description(&self) -> &str {
        "Rick and Morty API characters"
    }

    async fn id_bound(&self) -> Result<u64, TallyError> {
        self.counts
            .get_or_refresh(Source::RickAndMorty, || self.fetch_count())
            .await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError> {
        let url = join_url(&self.base_url, &format!("character/{}", id));
        let raw: RawCharacter = fetch_json(
            self.transport.as_ref(),
            Source::RickAndMorty,
            &url,
            &format!("character {}", id),
        )
        .await?;

        Ok(Character {
            source: Source::RickAndMorty,
            source_id: raw.id.to_string(),
            name: raw.name,
            image: raw.image.unwrap_or_default(),
        })
    }
}
