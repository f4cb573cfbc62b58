//! Time-bounded memo of resolved paths.
//!
//! Entries are keyed by the ordered `(source, destination)` pair and expire
//! on a sliding window: every hit pushes the expiration `ttl` ticks past the
//! access time. Unreachable results are cached too, so a disconnected pair
//! is not searched again until the entry expires or the cache is
//! invalidated.
//!
//! Expired entries are not evicted on lookup; callers run
//! [`sweep_expired`](PathCache::sweep_expired) once per distribution cycle.

use std::collections::HashMap;

use tracing::trace;
use voltgrid_core::fixed::Ticks;
use voltgrid_core::position::Position;

use crate::path::Path;

/// A cached path and the tick at which it stops being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: Path,
    pub expires_at: Ticks,
}

impl CacheEntry {
    /// Live while `now < expires_at`.
    pub fn is_live(&self, now: Ticks) -> bool {
        now < self.expires_at
    }
}

/// Lookup counters. `misses` counts every search the cache ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

/// Sliding-TTL cache of resolved paths.
#[derive(Debug, Clone)]
pub struct PathCache {
    ttl: Ticks,
    entries: HashMap<(Position, Position), CacheEntry>,
    stats: CacheStats,
}

impl PathCache {
    pub fn new(ttl: Ticks) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Ticks {
        self.ttl
    }

    /// Return the live path for the pair, sliding its expiration forward.
    pub fn lookup(&mut self, from: Position, to: Position, now: Ticks) -> Option<&Path> {
        let ttl = self.ttl;
        match self.entries.get_mut(&(from, to)) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = now.saturating_add(ttl);
                self.stats.hits += 1;
                Some(&entry.path)
            }
            _ => None,
        }
    }

    /// Store `path` for the pair with a fresh expiration, replacing any
    /// previous entry.
    pub fn store(&mut self, from: Position, to: Position, path: Path, now: Ticks) {
        self.entries.insert(
            (from, to),
            CacheEntry {
                path,
                expires_at: now.saturating_add(self.ttl),
            },
        );
    }

    /// Return the cached path for the pair, or run `search`, cache its
    /// result (even if unreachable), and return that.
    pub fn resolve<F>(&mut self, from: Position, to: Position, now: Ticks, search: F) -> Path
    where
        F: FnOnce() -> Path,
    {
        if let Some(path) = self.lookup(from, to, now) {
            return path.clone();
        }
        self.resolve_fresh(from, to, now, search)
    }

    /// Run `search` unconditionally and cache the result.
    pub fn resolve_fresh<F>(&mut self, from: Position, to: Position, now: Ticks, search: F) -> Path
    where
        F: FnOnce() -> Path,
    {
        self.stats.misses += 1;
        let path = search();
        trace!(%from, %to, hops = path.hops(), reachable = path.is_reachable(), "path cache miss");
        self.store(from, to, path.clone(), now);
        path
    }

    /// Evict every entry whose expiration has passed. Returns the count.
    pub fn sweep_expired(&mut self, now: Ticks) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let evicted = before - self.entries.len();
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Drop every entry.
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.stats.invalidations += 1;
    }

    pub fn entry(&self, from: Position, to: Position) -> Option<&CacheEntry> {
        self.entries.get(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltgrid_core::test_utils::px;

    fn two_hop() -> Path {
        Path::from_positions(vec![px(0), px(1), px(2)])
    }

    #[test]
    fn miss_then_hit() {
        let mut cache = PathCache::new(30);
        let mut calls = 0;
        let p = cache.resolve(px(0), px(2), 0, || {
            calls += 1;
            two_hop()
        });
        assert_eq!(p, two_hop());
        let p = cache.resolve(px(0), px(2), 1, || {
            calls += 1;
            Path::unreachable()
        });
        assert_eq!(p, two_hop());
        assert_eq!(calls, 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn key_is_ordered() {
        let mut cache = PathCache::new(30);
        cache.store(px(0), px(2), two_hop(), 0);
        assert!(cache.lookup(px(2), px(0), 0).is_none());
    }

    #[test]
    fn unreachable_results_are_cached() {
        let mut cache = PathCache::new(30);
        let mut calls = 0;
        for now in 0..5 {
            let p = cache.resolve(px(0), px(9), now, || {
                calls += 1;
                Path::unreachable()
            });
            assert!(p.is_empty());
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn entry_expires_after_ttl_without_access() {
        let mut cache = PathCache::new(30);
        cache.store(px(0), px(2), two_hop(), 0);
        assert!(cache.lookup(px(0), px(2), 29).is_some());
        // The hit at 29 slid expiry to 59.
        assert!(cache.lookup(px(0), px(2), 58).is_some());
        assert!(cache.lookup(px(0), px(2), 88).is_none());
    }

    #[test]
    fn access_just_before_expiry_survives_next_sweep() {
        let mut cache = PathCache::new(30);
        cache.store(px(0), px(2), two_hop(), 0);
        assert_eq!(cache.entry(px(0), px(2)).unwrap().expires_at, 30);

        assert!(cache.lookup(px(0), px(2), 29).is_some());
        assert_eq!(cache.entry(px(0), px(2)).unwrap().expires_at, 59);

        assert_eq!(cache.sweep_expired(30), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sweep_evicts_only_expired() {
        let mut cache = PathCache::new(10);
        cache.store(px(0), px(1), two_hop(), 0);
        cache.store(px(0), px(2), two_hop(), 5);
        assert_eq!(cache.sweep_expired(10), 1);
        assert!(cache.entry(px(0), px(1)).is_none());
        assert!(cache.entry(px(0), px(2)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn expired_entry_is_recomputed_even_before_sweep() {
        let mut cache = PathCache::new(10);
        cache.store(px(0), px(2), two_hop(), 0);
        let mut calls = 0;
        let p = cache.resolve(px(0), px(2), 10, || {
            calls += 1;
            Path::unreachable()
        });
        assert!(p.is_empty());
        assert_eq!(calls, 1);
        assert_eq!(cache.entry(px(0), px(2)).unwrap().expires_at, 20);
    }

    #[test]
    fn invalidate_all_forces_recompute() {
        let mut cache = PathCache::new(30);
        cache.store(px(0), px(2), two_hop(), 0);
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);

        let mut calls = 0;
        cache.resolve(px(0), px(2), 1, || {
            calls += 1;
            two_hop()
        });
        assert_eq!(calls, 1);
    }
}
