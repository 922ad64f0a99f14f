//! `CharacterService` over stub adapters and the in-memory store.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use character_tally::cache::CountCache;
use character_tally::models::{
    CharacterRecord, ListQuery, SortField, SortOrder, Vote, VoteRequest,
};
use character_tally::service::{builtin_adapters, CharacterService};
use character_tally::store::memory::InMemoryStore;
use character_tally::store::TallyStore;
use character_tally::traits::AdapterRegistry;
use character_tally::{Character, Source, TallyError};

use common::{ok, pikachu, rick, test_config, FixedAdapter, StubTransport};

fn service_with(adapters: Vec<Box<FixedAdapter>>) -> (CharacterService, Arc<InMemoryStore>) {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    let store = Arc::new(InMemoryStore::new());
    (CharacterService::new(registry, store.clone()), store)
}

fn vote(source: Source, id: &str, name: &str, vote: Vote) -> VoteRequest {
    VoteRequest {
        source,
        source_id: id.into(),
        name: name.into(),
        image: String::new(),
        vote,
    }
}

#[tokio::test]
async fn random_pokemon_is_returned_and_recorded_as_seen() {
    let (service, store) = service_with(vec![FixedAdapter::returning(pikachu())]);

    let character = service
        .get_random_character(Some(Source::Pokemon))
        .await
        .unwrap();
    assert_eq!(character, pikachu());

    let json = serde_json::to_value(&character).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"source":"pokemon","sourceId":"25","name":"Pikachu","image":"img"})
    );

    let record = store.get(Source::Pokemon, "25").await.unwrap().unwrap();
    assert_eq!(record.likes, 0);
    assert_eq!(record.dislikes, 0);
    assert!(record.last_evaluated_at.is_none());
    assert_eq!(record.image_url.as_deref(), Some("img"));
}

#[tokio::test]
async fn random_without_source_picks_an_available_one() {
    let (service, _store) = service_with(vec![
        FixedAdapter::returning(pikachu()),
        FixedAdapter::returning(rick()),
        FixedAdapter::misconfigured(Source::Superhero, "SUPERHERO_API_KEY is not set"),
    ]);

    for _ in 0..20 {
        let character = service.get_random_character(None).await.unwrap();
        assert_ne!(character.source, Source::Superhero);
    }
}

#[tokio::test]
async fn explicit_misconfigured_source_is_reported_as_such() {
    let (service, _store) = service_with(vec![
        FixedAdapter::returning(pikachu()),
        FixedAdapter::misconfigured(Source::Superhero, "SUPERHERO_API_KEY is not set"),
    ]);

    assert_eq!(service.available_sources(), vec![Source::Pokemon]);

    let err = service
        .get_random_character(Some(Source::Superhero))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::Misconfigured { catalog: Source::Superhero, .. }));

    let err = service
        .get_random_character(Some(Source::DragonBall))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::InvalidSource(ref s) if s == "dragonball"));
}

#[tokio::test]
async fn empty_registry_has_no_sources() {
    let (service, _store) = service_with(vec![]);
    let err = service.get_random_character(None).await.unwrap_err();
    assert!(matches!(err, TallyError::NoSourcesAvailable));
}

#[tokio::test]
async fn upstream_failure_records_nothing() {
    let (service, store) =
        service_with(vec![FixedAdapter::failing(Source::Pokemon, "HTTP 500")]);

    let err = service
        .get_random_character(Some(Source::Pokemon))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::UpstreamUnavailable { .. }));

    let (items, total) = store.list(&ListQuery::default()).await.unwrap();
    assert!(items.is_empty());
    assert_eq!(total, 0);
}

/// Store whose every operation fails.
struct BrokenStore;

#[async_trait]
impl TallyStore for BrokenStore {
    async fn record_seen(&self, _c: &Character, _at: DateTime<Utc>) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }
    async fn record_vote(&self, _v: &VoteRequest, _at: DateTime<Utc>) -> anyhow::Result<()> {
        anyhow::bail!("database is locked")
    }
    async fn list(&self, _q: &ListQuery) -> anyhow::Result<(Vec<CharacterRecord>, i64)> {
        anyhow::bail!("database is locked")
    }
    async fn find_top(&self, _f: SortField) -> anyhow::Result<Option<CharacterRecord>> {
        anyhow::bail!("database is locked")
    }
    async fn get(&self, _s: Source, _id: &str) -> anyhow::Result<Option<CharacterRecord>> {
        anyhow::bail!("database is locked")
    }
}

#[tokio::test]
async fn storage_failure_after_fetch_propagates() {
    let mut registry = AdapterRegistry::new();
    registry.register(FixedAdapter::returning(pikachu()));
    let service = CharacterService::new(registry, Arc::new(BrokenStore));

    let err = service
        .get_random_character(Some(Source::Pokemon))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::Storage(_)));
    assert_eq!(err.code(), "storage_failure");

    let err = service.top_liked().await.unwrap_err();
    assert!(matches!(err, TallyError::Storage(_)));
}

#[tokio::test]
async fn like_then_dislike_keeps_both_counts() {
    let (service, store) = service_with(vec![FixedAdapter::returning(pikachu())]);

    service
        .record_vote(&vote(Source::Pokemon, "25", "Pikachu", Vote::Like))
        .await
        .unwrap();
    let ack = service
        .record_vote(&vote(Source::Pokemon, "25", "Pikachu", Vote::Dislike))
        .await
        .unwrap();
    assert!(ack.ok);

    let after_votes = store.get(Source::Pokemon, "25").await.unwrap().unwrap();
    assert_eq!(after_votes.likes, 1);
    assert_eq!(after_votes.dislikes, 1);
    assert!(after_votes.last_evaluated_at.is_some());

    // A later fetch of the same character leaves the tally alone.
    service
        .get_random_character(Some(Source::Pokemon))
        .await
        .unwrap();
    let after_seen = store.get(Source::Pokemon, "25").await.unwrap().unwrap();
    assert_eq!(after_seen.likes, 1);
    assert_eq!(after_seen.dislikes, 1);
    assert_eq!(after_seen.last_evaluated_at, after_votes.last_evaluated_at);
}

#[tokio::test]
async fn vote_requires_id_and_name() {
    let (service, store) = service_with(vec![]);

    let err = service
        .record_vote(&vote(Source::Pokemon, "", "Pikachu", Vote::Like))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::InvalidInput(_)));

    let err = service
        .record_vote(&vote(Source::Pokemon, "25", "  ", Vote::Like))
        .await
        .unwrap_err();
    assert!(matches!(err, TallyError::InvalidInput(_)));

    assert!(store.get(Source::Pokemon, "25").await.unwrap().is_none());
}

#[tokio::test]
async fn list_by_likes_returns_the_top_record_and_total() {
    let (service, _store) = service_with(vec![]);
    for (id, likes) in [("a", 2), ("b", 5), ("c", 1)] {
        for _ in 0..likes {
            service
                .record_vote(&vote(Source::DragonBall, id, id, Vote::Like))
                .await
                .unwrap();
        }
    }

    let page = service
        .list_characters(&ListQuery {
            sort_by: SortField::Likes,
            order: SortOrder::Desc,
            limit: 1,
            ..ListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].source_id, "b");
    assert_eq!(page.items[0].likes, 5);

    let top = service.top_liked().await.unwrap().unwrap();
    assert_eq!(top.source_id, "b");
}

#[tokio::test]
async fn list_rejects_out_of_range_limit() {
    let (service, _store) = service_with(vec![]);
    for limit in [0, 101] {
        let err = service
            .list_characters(&ListQuery {
                limit,
                ..ListQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TallyError::InvalidInput(_)));
    }
}

#[tokio::test]
async fn top_queries_on_empty_store_are_none() {
    let (service, _store) = service_with(vec![]);
    assert!(service.top_liked().await.unwrap().is_none());
    assert!(service.top_disliked().await.unwrap().is_none());
    assert!(service.last_evaluated().await.unwrap().is_none());
}

#[tokio::test]
async fn last_evaluated_follows_the_latest_vote() {
    let (service, _store) = service_with(vec![]);
    service
        .record_vote(&vote(Source::Pokemon, "1", "bulbasaur", Vote::Like))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service
        .record_vote(&vote(Source::Pokemon, "4", "charmander", Vote::Dislike))
        .await
        .unwrap();

    let last = service.last_evaluated().await.unwrap().unwrap();
    assert_eq!(last.source_id, "4");
    assert!(last.last_evaluated_at.unwrap().ends_with('Z'));

    let top = service.top_disliked().await.unwrap().unwrap();
    assert_eq!(top.name, "charmander");
}

#[tokio::test]
async fn builtin_adapters_hide_superhero_without_key() {
    let config = test_config();
    let stub = StubTransport::new(|_| ok("{}"));
    let registry = builtin_adapters(&config, stub, Arc::new(CountCache::default()));
    let service = CharacterService::new(registry, Arc::new(InMemoryStore::new()));

    let available = service.available_sources();
    assert_eq!(available.len(), 3);
    assert!(!available.contains(&Source::Superhero));
}
