//! Shared stubs for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use character_tally::config::Config;
use character_tally::traits::{Availability, SourceAdapter};
use character_tally::transport::{HttpTransport, UpstreamResponse};
use character_tally::{Character, Source, TallyError};

type Responder = Box<dyn Fn(&str) -> UpstreamResponse + Send + Sync>;

/// Transport answering every GET through a closure and recording the URLs.
pub struct StubTransport {
    respond: Responder,
    calls: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn new(respond: impl Fn(&str) -> UpstreamResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, pred: impl Fn(&str) -> bool) -> usize {
        self.calls().iter().filter(|u| pred(u)).count()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn get(&self, url: &str) -> anyhow::Result<UpstreamResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok((self.respond)(url))
    }
}

pub fn ok(body: impl Into<String>) -> UpstreamResponse {
    UpstreamResponse {
        status: 200,
        body: body.into(),
    }
}

pub fn status(code: u16) -> UpstreamResponse {
    UpstreamResponse {
        status: code,
        body: String::new(),
    }
}

/// Trailing numeric path segment of a URL.
pub fn trailing_id(url: &str) -> u64 {
    url.rsplit('/').next().unwrap().parse().unwrap()
}

/// Config pointing every source at an unroutable test host.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.sources.rickandmorty.base_url = "http://rm.test/api".into();
    config.sources.pokemon.base_url = "http://poke.test/api/v2".into();
    config.sources.superhero.base_url = "http://hero.test/api".into();
    config.sources.dragonball.base_url = "http://db.test/api".into();
    config
}

/// Adapter returning one fixed character, or a fixed error.
pub struct FixedAdapter {
    pub source: Source,
    pub result: Result<Character, String>,
    pub availability: Availability,
}

impl FixedAdapter {
    pub fn returning(character: Character) -> Box<Self> {
        Box::new(Self {
            source: character.source,
            result: Ok(character),
            availability: Availability::Ready,
        })
    }

    pub fn failing(source: Source, reason: &str) -> Box<Self> {
        Box::new(Self {
            source,
            result: Err(reason.to_string()),
            availability: Availability::Ready,
        })
    }

    pub fn misconfigured(source: Source, reason: &str) -> Box<Self> {
        Box::new(Self {
            source,
            result: Err(reason.to_string()),
            availability: Availability::Misconfigured(reason.to_string()),
        })
    }
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    fn source(&self) -> Source {
        self.source
    }

    fn description(&self) -> &str {
        "fixed test adapter"
    }

    fn availability(&self) -> Availability {
        self.availability.clone()
    }

    async fn id_bound(&self) -> Result<u64, TallyError> {
        Ok(1)
    }

    async fn fetch_by_id(&self, _id: u64) -> Result<Character, TallyError> {
        self.result
            .clone()
            .map_err(|reason| TallyError::upstream(self.source, reason))
    }
}

pub fn pikachu() -> Character {
    Character {
        source: Source::Pokemon,
        source_id: "25".into(),
        name: "Pikachu".into(),
        image: "img".into(),
    }
}

pub fn rick() -> Character {
    Character {
        source: Source::RickAndMorty,
        source_id: "1".into(),
        name: "Rick Sanchez".into(),
        image: "rick.png".into(),
    }
}
