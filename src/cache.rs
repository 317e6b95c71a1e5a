//! TTL-keyed in-memory cache for upstream responses.
//!
//! Play descriptors carry signed, expiring URLs, so their TTL is derived
//! from the provider's `expires_in` hint and clamped to a safe window.
//! Catalog surfaces (languages, home, search, episodes) are not signed and
//! use longer fixed TTLs.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::{Duration, Instant};

/// Clamp window for play-descriptor TTLs. Too long serves dead links,
/// too short defeats caching.
pub const PLAY_TTL_MIN_MS: u64 = 5_000;
pub const PLAY_TTL_MAX_MS: u64 = 600_000;
/// Used when the provider gives no `expires_in` hint.
pub const PLAY_TTL_DEFAULT_MS: u64 = 20_000;

pub const LANGUAGES_TTL_MS: u64 = 12 * 60 * 60 * 1000;
pub const HOME_TTL_MS: u64 = 2 * 60 * 1000;
pub const SEARCH_TTL_MS: u64 = 60 * 1000;
pub const EPISODES_TTL_MS: u64 = 10 * 60 * 1000;

/// TTL for a play descriptor given the provider's remaining-validity hint.
pub fn play_ttl_ms(expires_in_secs: Option<u64>) -> u64 {
    let hinted = expires_in_secs
        .map(|s| s.saturating_mul(1000))
        .unwrap_or(PLAY_TTL_DEFAULT_MS);
    hinted.clamp(PLAY_TTL_MIN_MS, PLAY_TTL_MAX_MS)
}

/// Joins key parts the way cache keys are spelled everywhere here.
pub fn cache_key(parts: &[&str]) -> String {
    parts.join("|")
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.stored_at + self.ttl
    }
}

/// String-keyed cache with lazy expiry and per-key single-flight fetch.
pub struct TtlCache<V> {
    entries: DashMap<String, Entry<V>>,
    flights: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            flights: DashMap::new(),
        }
    }

    /// A hit only while `now < stored_at + ttl`; expired entries are
    /// removed on access.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            // Shard guard must drop before the removal below.
            let entry = self.entries.get(key)?;
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn put(&self, key: &str, value: V, ttl_ms: u64) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
                ttl: Duration::from_millis(ttl_ms),
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Cache-or-fetch with per-key de-duplication: concurrent callers for
    /// the same key converge on one upstream call. `ttl_of` derives the
    /// storage TTL from the fetched value. Fetch failures are never cached.
    pub async fn get_or_fetch<E, F, Fut>(
        &self,
        key: &str,
        ttl_of: impl Fn(&V) -> u64,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        let flight = self
            .flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let _guard = flight.lock().await;

        // Another caller may have filled the entry while we waited.
        if let Some(hit) = self.get(key) {
            return Ok(hit);
        }

        // The flight entry must go on both branches; failed fetches for
        // high-cardinality keys (search) would otherwise pin a mutex each.
        match fetch().await {
            Ok(value) => {
                self.put(key, value.clone(), ttl_of(&value));
                self.flights.remove(key);
                Ok(value)
            }
            Err(e) => {
                self.flights.remove(key);
                Err(e)
            }
        }
    }
}
