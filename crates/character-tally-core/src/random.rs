//! Uniform random choices: catalog ids and source selection.

use rand::Rng;

/// Pick an id uniformly from `[1, max]`. A `max` of 0 is treated as 1 so a
/// bogus count from upstream still yields a requestable id.
pub fn random_id<R: Rng + ?Sized>(rng: &mut R, max: u64) -> u64 {
    rng.random_range(1..=max.max(1))
}

/// Pick one element uniformly, or `None` for an empty slice.
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len()))
}
