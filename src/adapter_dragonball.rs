//! Dragon Ball API adapter.
//!
//! The catalog is small and stable, so the id bound is the configured
//! `max_id` (default 58). Characters come from `GET {base}/characters/{id}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use character_tally_core::{Character, Source, TallyError};

use crate::config::DragonBallConfig;
use crate::traits::{join_url, ExternalId, SourceAdapter};
use crate::transport::{fetch_json, HttpTransport};

#[derive(Debug, Deserialize)]
struct RawFighter {
    id: Option<ExternalId>,
    name: Option<String>,
    image: Option<String>,
}

pub struct DragonBallAdapter {
    base_url: String,
    max_id: u64,
    transport: Arc<dyn HttpTransport>,
}

impl DragonBallAdapter {
    pub fn new(config: &DragonBallConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            max_id: config.max_id,
            transport,
        }
    }
}

#[async_trait]
impl SourceAdapter for DragonBallAdapter {
    fn source(&self) -> Source {
        Source::DragonBall
    }

    fn description(&self) -> &str {
        "Dragon Ball API characters"
    }

    async fn id_bound(&self) -> Result<u64, TallyError> {
        Ok(self.max_id)
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError> {
        let url = join_url(&self.base_url, &format!("characters/{}", id));
        let raw: RawFighter = fetch_json(
            self.transport.as_ref(),
            Source::DragonBall,
            &url,
            &format!("character {}", id),
        )
        .await?;

        Ok(Character {
            source: Source::DragonBall,
            source_id: raw.id.map(|v| v.to_string()).unwrap_or_else(|| id.to_string()),
            name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
            image: raw.image.unwrap_or_default(),
        })
    }
}
