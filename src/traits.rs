//! The source adapter trait and its registry.
//!
//! Each external catalog is a [`SourceAdapter`]. Adapters are registered in
//! an [`AdapterRegistry`], which the character service consults to compute
//! the available sources and to dispatch fetches by [`Source`].
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               AdapterRegistry                │
//! │ ┌────────────┐ ┌─────────┐ ┌─────────────┐   │
//! │ │RickAndMorty│ │ Pokemon │ │ Superhero*  │ … │
//! │ └────────────┘ └─────────┘ └─────────────┘   │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!        CharacterService::get_random_character()
//! ```
//!
//! `*` gated by an API key.

use async_trait::async_trait;
use serde::Deserialize;

use character_tally_core::random::random_id;
use character_tally_core::{Character, Source, TallyError};

/// Whether an adapter can be used with the current configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    /// Registered but missing configuration (e.g. an API key).
    Misconfigured(String),
}

/// One external character catalog.
///
/// Implementors provide the id-space bound and a fetch by id; the default
/// [`fetch_random`](SourceAdapter::fetch_random) ties them together.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source(&self) -> Source;

    /// One-line description, shown by `tally sources`.
    fn description(&self) -> &str;

    fn availability(&self) -> Availability {
        Availability::Ready
    }

    /// Upper bound of the id space, inclusive.
    async fn id_bound(&self) -> Result<u64, TallyError>;

    /// Fetch and normalize the character with catalog id `id`.
    async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError>;

    /// Fetch a character with an id drawn uniformly from `[1, id_bound]`.
    async fn fetch_random(&self) -> Result<Character, TallyError> {
        let bound = self.id_bound().await?;
        let id = random_id(&mut rand::rng(), bound);
        tracing::debug!(source = %self.source(), id, bound, "fetching random character");
        self.fetch_by_id(id).await
    }
}

/// Ordered collection of adapters, at most one per [`Source`].
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any earlier one for the same source.
    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        self.adapters.retain(|a| a.source() != adapter.source());
        self.adapters.push(adapter);
    }

    pub fn find(&self, source: Source) -> Option<&dyn SourceAdapter> {
        self.adapters
            .iter()
            .find(|a| a.source() == source)
            .map(|a| a.as_ref())
    }

    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    /// Sources whose adapters report [`Availability::Ready`].
    pub fn available_sources(&self) -> Vec<Source> {
        self.adapters
            .iter()
            .filter(|a| a.availability() == Availability::Ready)
            .map(|a| a.source())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// An upstream id that may arrive as a JSON number or a string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExternalId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{}", n),
            ExternalId::Text(s) => f.write_str(s),
        }
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        source: Source,
        ready: bool,
    }

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn source(&self) -> Source {
            self.source
        }
        fn description(&self) -> &str {
            "fixed"
        }
        fn availability(&self) -> Availability {
            if self.ready {
                Availability::Ready
            } else {
                Availability::Misconfigured("no key".into())
            }
        }
        async fn id_bound(&self) -> Result<u64, TallyError> {
            Ok(3)
        }
        async fn fetch_by_id(&self, id: u64) -> Result<Character, TallyError> {
            Ok(Character {
                source: self.source,
                source_id: id.to_string(),
                name: "x".into(),
                image: String::new(),
            })
        }
    }

    #[test]
    fn registry_excludes_misconfigured_sources() {
        let mut registry = AdapterRegistry::new();
        registry.register(Box::new(Fixed {
            source: Source::Pokemon,
            ready: true,
        }));
        registry.register(Box::new(Fixed {
            source: Source::Superhero,
            ready: false,
        }));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.available_sources(), vec![Source::Pokemon]);
        assert!(registry.find(Source::Superhero).is_some());
        assert!(registry.find(Source::DragonBall).is_none());
    }

    #[test]
    fn register_replaces_same_source() {
        let mut registry = AdapterRegistry::new();
        for ready in [false, true] {
            registry.register(Box::new(Fixed {
                source: Source::Superhero,
                ready,
            }));
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.available_sources(), vec![Source::Superhero]);
    }

    #[tokio::test]
    async fn default_fetch_random_stays_in_bound() {
        let adapter = Fixed {
            source: Source::DragonBall,
            ready: true,
        };
        for _ in 0..50 {
            let c = adapter.fetch_random().await.unwrap();
            let id: u64 = c.source_id.parse().unwrap();
            assert!((1..=3).contains(&id));
        }
    }

    #[test]
    fn external_id_accepts_numbers_and_strings() {
        let n: ExternalId = serde_json::from_str("25").unwrap();
        let s: ExternalId = serde_json::from_str("\"70\"").unwrap();
        assert_eq!(n.to_string(), "25");
        assert_eq!(s.to_string(), "70");
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(
            join_url("https://pokeapi.co/api/v2/", "/pokemon/25"),
            "https://pokeapi.co/api/v2/pokemon/25"
        );
    }
}
