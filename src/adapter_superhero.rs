//! Superhero API adapter.
//!
//! Gated by an API key: without one the adapter reports
//! [`Availability::Misconfigured`] and is never offered as a random choice.
//! The key is embedded in the request path, `GET {base}/{key}/{id}`, so
//! URLs from this adapter are never logged.
//!
//! The API answers HTTP 200 even for failures and signals them with an
//! in-body envelope, `{"response": "error", "error": "..."}`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use character_tally_core::{Character, Source, TallyError};

use crate::config::SuperheroConfig;
use crate::traits::{join_url, Availability, ExternalId, SourceAdapter};
use crate::transport::{fetch_json, HttpTransport};

#[derive(Debug, Deserialize)]
struct RawHero {
    response: Option<String>,
    error: Option<String>,
    id: Option<ExternalId>,
    name: Option<String>,
    image: Option<HeroImage>,
}

#[derive(Debug, Deserialize)]
struct HeroImage {
    url: Option<String>,
}

pub struct SuperheroAdapter {
    base_url: String,
    api_key: Option<String>,
    max_id: u64,
    transport: Arc<dyn HttpTransport>,
}

impl SuperheroAdapter {
    pub fn new(config: &SuperheroConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key().map(str::to_string),
            max_id: config.max_id,
            transport,
        }
    }

    fn misconfigured(&self) -> TallyError {
        TallyError::Misconfigured {
            catalog: Source::Superhero,
            reason: "SUPERHERO_API_KEY is not set".to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for SuperheroAdapter {
    fn source(&self) -> Source {
        Source::Superhero
    }

    fn description(&self) -> &str {
        "Superhero API heroes and villains (requires an API key)"
    }

    fn availability(&self) -> Availability {
        match self.api_key {
            Some(_) => Availability::Ready,
            None => Availability::Misconfigured("SUPERHERO_API_KEY is not set".to_string()),
        }
    }

    async fn id_bound(&self) -> Result<u64, TallyError> {
        Ok(self.max_id)
    }

    async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError> {
        let key = self.api_key.as_deref().ok_or_else(|| self.misconfigured())?;
        let url = join_url(&self.base_url, &format!("{}/{}", key, id));
        let raw: RawHero = fetch_json(
            self.transport.as_ref(),
            Source::Superhero,
            &url,
            &format!("hero {}", id),
        )
        .await?;

        if raw.response.as_deref() == Some("error") {
            let detail = raw.error.as_deref().unwrap_or("unknown error");
            tracing::warn!(id, detail, "superhero API answered with an error envelope");
            return Err(TallyError::upstream(
                Source::Superhero,
                format!("hero {} error: {}", id, detail),
            ));
        }

        Ok(Character {
            source: Source::Superhero,
            source_id: raw.id.map(|v| v.to_string()).unwrap_or_else(|| id.to_string()),
            name: raw.name.unwrap_or_else(|| "Unknown".to_string()),
            image: raw.image.and_then(|i| i.url).unwrap_or_default(),
        })
    }
}
