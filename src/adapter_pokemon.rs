//! PokéAPI adapter.
//!
//! The id bound comes from the shared [`CountCache`], refreshed from
//! `GET {base}/pokemon?limit=1` (`count`). Pokémon are read from
//! `GET {base}/pokemon/{id}`.
//!
//! Sprites are sparse upstream, so the image falls back through
//! `sprites.other["official-artwork"].front_default`, then
//! `sprites.front_default`, then the empty string.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use character_tally_core::cache::CountCache;
use character_tally_core::{Character, Source, TallyError};

use crate::config::PokemonConfig;
use crate::traits::{join_url, ExternalId, SourceAdapter};
use crate::transport::{fetch_json, HttpTransport};

#[derive(Debug, Deserialize)]
struct PokemonList {
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawPokemon {
    id: ExternalId,
    name: String,
    #[serde(default)]
    sprites: Option<Sprites>,
}

#[derive(Debug, Default, Deserialize)]
struct Sprites {
    front_default: Option<String>,
    #[serde(default)]
    other: Option<OtherSprites>,
}

#[derive(Debug, Default, Deserialize)]
struct OtherSprites {
    #[serde(rename = "official-artwork")]
    official_artwork: Option<Artwork>,
}

#[derive(Debug, Default, Deserialize)]
struct Artwork {
    front_default: Option<String>,
}

impl RawPokemon {
    fn image(&self) -> String {
        let sprites = self.sprites.as_ref();
        sprites
            .and_then(|s| s.other.as_ref())
            .and_then(|o| o.official_artwork.as_ref())
            .and_then(|a| a.front_default.clone())
            .or_else(|| sprites.and_then(|s| s.front_default.clone()))
            .unwrap_or_default()
    }
}

pub struct PokemonAdapter {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    counts: Arc<CountCache>,
}

impl PokemonAdapter {
    pub fn new(
        config: &PokemonConfig,
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
        let url = join_url(&self.base_url, "pokemon?limit=1");
        let list: PokemonList =
            fetch_json(self.transport.as_ref(), Source::Pokemon, &url, "pokemon count").await?;
        Ok(list.count.unwrap_or(0))
    }
}

#[async_trait]
impl SourceAdapter for PokemonAdapter {
    fn source(&self) -> Source {
        Source::Pokemon
    }

    fn description(&self) -> &str {
        "PokéAPI pokémon"
    }

    async fn id_bound(&self) -> Result<u64, TallyError> {
        self.counts
            .get_or_refresh(Source::Pokemon, || self.fetch_count())
            .await
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError> {
        let url = join_url(&self.base_url, &format!("pokemon/{}", id));
        let raw: RawPokemon = fetch_json(
            self.transport.as_ref(),
            Source::Pokemon,
            &url,
            &format!("pokemon {}", id),
        )
        .await?;

        let image = raw.image();
        Ok(Character {
            source: Source::Pokemon,
            source_id: raw.id.to_string(),
            name: raw.name,
            image,
        })
    }
}
