use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::{DistanceCalculator, DistanceError, normalize_city};

pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct Entry {
    km: f64,
    last_used: AtomicU64,
}

/// Memoises a `DistanceCalculator` by normalised, unordered city pair.
///
/// Failed lookups are not cached, and neither are pairs naming the same city
/// on both sides (the inner calculator answers those without a lookup). The
/// map holds at most `capacity` pairs; inserting past that evicts the least
/// recently used one.
#[derive(Debug)]
pub struct CachedDistance<D> {
    inner: D,
    capacity: usize,
    clock: AtomicU64,
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl<D: Default + DistanceCalculator> Default for CachedDistance<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D: DistanceCalculator> CachedDistance<D> {
    pub fn new(inner: D) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    /// A zero capacity disables memoisation.
    pub fn with_capacity(inner: D, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            clock: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cached_pairs(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn remember(&self, key: (String, String), km: f64) {
        if self.capacity == 0 {
            return;
        }
        // A poisoned lock only costs us the memo.
        let Ok(mut entries) = self.entries.write() else {
            return;
        };

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                debug!(city_a = %oldest.0, city_b = %oldest.1, "distance evicted");
            }
        }

        entries.insert(
            key,
            Entry {
                km,
                last_used: AtomicU64::new(self.tick()),
            },
        );
    }
}

impl<D: DistanceCalculator> DistanceCalculator for CachedDistance<D> {
    fn distance_km(&self, city_a: &str, city_b: &str) -> Result<f64, DistanceError> {
        let a = normalize_city(city_a);
        let b = normalize_city(city_b);

        if a == b {
            return self.inner.distance_km(city_a, city_b);
        }

        let key = if a <= b { (a, b) } else { (b, a) };

        if let Ok(entries) = self.entries.read() {
            if let Some(entry) = entries.get(&key) {
                entry.last_used.store(self.tick(), Ordering::Relaxed);
                return Ok(entry.km);
            }
        }

        let km = self.inner.distance_km(city_a, city_b)?;
        self.remember(key, km);
        debug!(city_a, city_b, km, "distance cached");
        Ok(km)
    }
}
