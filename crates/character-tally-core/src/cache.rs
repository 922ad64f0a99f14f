//! Per-source cache of upstream catalog sizes.
//!
//! Sources without a statically known population (Rick and Morty, PokéAPI)
//! expose a "total count" endpoint. The count bounds the random id domain,
//! so it is fetched lazily and reused until it goes stale.
//!
//! Entries are `Copy` values replaced wholesale. Locks are only held to copy
//! an entry out or swap one in, never across the refresh I/O, so two
//! concurrent misses may both refresh; the later write simply wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use crate::error::TallyError;
use crate::models::Source;

/// Default validity window of a cached count.
pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(10 * 60);

/// A cached catalog size and when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountEntry {
    pub value: u64,
    pub updated_at: Instant,
}

impl CountEntry {
    /// Usable iff younger than `ttl` and non-zero.
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        self.value > 0 && now.saturating_duration_since(self.updated_at) < ttl
    }
}

/// Count cache owned by one running service and shared between adapters.
pub struct CountCache {
    ttl: Duration,
    cells: RwLock<HashMap<Source, CountEntry>>,
}

impl CountCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            cells: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Raw entry for `source`, fresh or not.
    pub fn entry(&self, source: Source) -> Option<CountEntry> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&source)
            .copied()
    }

    /// Cached value if the entry is still valid.
    pub fn get(&self, source: Source) -> Option<u64> {
        self.entry(source)
            .filter(|entry| entry.is_fresh(Instant::now(), self.ttl))
            .map(|entry| entry.value)
    }

    /// Replace the entry for `source` with `value`, stamped now.
    pub fn store(&self, source: Source, value: u64) {
        let entry = CountEntry {
            value,
            updated_at: Instant::now(),
        };
        self.cells
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source, entry);
    }

    /// Return the cached count, running `refresh` on a miss.
    ///
    /// A refresh result is stored as-is, including 0. A failed refresh leaves
    /// the previous entry untouched and its error propagates.
    pub async fn get_or_refresh<F, Fut>(&self, source: Source, refresh: F) -> Result<u64, TallyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<u64, TallyError>>,
    {
        if let Some(value) = self.get(source) {
            return Ok(value);
        }
        let value = refresh().await?;
        self.store(source, value);
        Ok(value)
    }
}

impl Default for CountCache {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_TTL)
    }
}
