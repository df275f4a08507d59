//! Concurrent memo table for resolved lookups.
//!
//! A [`LookupCache`] belongs to exactly one registry snapshot and remembers which service a
//! requested tag resolved to. It only ever grows. Concurrent writers that race on the same tag
//! all computed the same resolution, so whichever insert lands first is kept and the others are
//! dropped.
//!
//! The cache is an optimization layer only: it takes no part in registry equality or hashing.

use std::fmt;

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::{service::Service, tag::CapabilityTag};

/// Grow-only concurrent map from requested tag to resolved service.
pub(crate) struct LookupCache<T: CapabilityTag> {
    entries: DashMap<T, Service, FxBuildHasher>,
    enabled: bool,
}

impl<T: CapabilityTag> LookupCache<T> {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `enabled` - When `false`, every read misses and every write is dropped
    pub(crate) fn new(enabled: bool) -> Self {
        LookupCache {
            entries: DashMap::with_hasher(FxBuildHasher),
            enabled,
        }
    }

    /// Creates a cache pre-populated with a copy of `seed`'s entries.
    ///
    /// The copy is independent: later writes to either cache are not visible in the other.
    pub(crate) fn seeded_from(seed: &LookupCache<T>, enabled: bool) -> Self {
        if !enabled {
            return Self::new(false);
        }

        LookupCache {
            entries: seed.entries.clone(),
            enabled,
        }
    }

    /// Returns the memoized resolution for `tag`, if any.
    pub(crate) fn get(&self, tag: &T) -> Option<Service> {
        if !self.enabled {
            return None;
        }

        self.entries.get(tag).map(|entry| entry.value().clone())
    }

    /// Memoizes `service` for `tag` unless a resolution is already present.
    pub(crate) fn put_if_absent(&self, tag: T, service: Service) {
        if self.enabled {
            self.entries.entry(tag).or_insert(service);
        }
    }

    /// Returns the number of memoized resolutions.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T: CapabilityTag> fmt::Debug for LookupCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupCache")
            .field("entries", &self.entries.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}
