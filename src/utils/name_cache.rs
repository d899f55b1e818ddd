//! Name Cache for Resource-Name Interning
//!
//! Encoding a packet writes the target resource name on every frame; most
//! connections talk to a handful of resources, so re-encoding the same
//! string thousands of times is pure overhead. This per-connection cache
//! maps a resource name to its pre-encoded byte form.
//!
//! The cache is bounded by a deliberately simple policy: when an insertion
//! finds the cache already at its limit, the whole cache is cleared first,
//! so the new entry survives the clear. This is eviction-by-reset, not LRU —
//! the reset changes observable miss timing for every cached name at once,
//! and callers must not assume contents are stable across an insertion that
//! crosses the threshold.

use crate::config::NAME_CACHE_LIMIT;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Bounded per-connection map from resource name to its encoded byte form.
///
/// Values are `Arc<[u8]>` so a cache hit hands back the identical cached
/// allocation rather than a copy.
#[derive(Debug)]
pub struct NameCache {
    entries: HashMap<String, Arc<[u8]>>,
    limit: usize,
}

impl NameCache {
    /// Create a cache with the default entry limit (10 000)
    pub fn new() -> Self {
        Self::with_limit(NAME_CACHE_LIMIT)
    }

    /// Create a cache with a custom entry limit
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit,
        }
    }

    /// Look up the encoded form of `name`, encoding and inserting on a miss.
    ///
    /// A miss that finds the cache at its limit clears it entirely before
    /// inserting, so the returned entry is always cached on return.
    pub fn resolve(&mut self, name: &str) -> Arc<[u8]> {
        if let Some(bytes) = self.entries.get(name) {
            return Arc::clone(bytes);
        }

        if self.entries.len() >= self.limit {
            debug!(
                entries = self.entries.len(),
                limit = self.limit,
                "Name cache at limit, clearing"
            );
            self.entries.clear();
        }

        let bytes: Arc<[u8]> = Arc::from(name.as_bytes());
        self.entries.insert(name.to_string(), Arc::clone(&bytes));
        bytes
    }

    /// Current number of cached names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry limit that triggers the clear
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drop all entries (useful for testing or manual cache reset)
    pub fn clear(&mut self) {
        self.entries.clear();
        debug!("Name cache cleared");
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}
