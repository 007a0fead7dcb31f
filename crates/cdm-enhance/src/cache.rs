//! Opt-in, single-slot data cache held by every variable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use cdm_common::Array;
use serde::Serialize;

/// Cache statistics for one variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached: bool,
}

/// Holds the unconverted data of one variable once it has been read.
///
/// Enabling and disabling take `&mut self`; lookups and stores go through
/// the lock so concurrent first reads may each populate the slot, the last
/// one winning.
#[derive(Debug, Default)]
pub struct DataCache {
    enabled: bool,
    slot: RwLock<Option<Arc<Array>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DataCache {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn caching on or off. Turning it off drops cached data.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }

    /// Cached data, if caching is enabled and the slot is filled.
    pub fn get(&self) -> Option<Arc<Array>> {
        if !self.enabled {
            return None;
        }
        let cached = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match cached {
            Some(data) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(data)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store freshly read data and return the shared snapshot.
    pub fn store(&self, data: Array) -> Arc<Array> {
        let data = Arc::new(data);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&data));
        data
    }

    /// Replace the cached data and enable caching.
    pub fn set(&mut self, data: Array) {
        self.enabled = true;
        *self.slot.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(data));
    }

    pub fn clear(&mut self) {
        *self.slot.get_mut().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cached: self
                .slot
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some(),
        }
    }
}
