//! Bounded cache of built presentations.
//!
//! Entries are keyed by file identity and remember the content fingerprint
//! they were built from. A lookup with different bytes drops the entry and
//! rebuilds it whole; entries are never patched.

use crate::types::Presentation;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// SHA-256 of the input bytes, lowercase hex.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

struct Entry {
    fingerprint: String,
    presentation: Arc<Presentation>,
    inserted: Instant,
}

struct Inner {
    entries: LruCache<String, Entry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// A bounded, least-recently-used cache with optional time-to-live.
pub struct PresentationCache {
    inner: Mutex<Inner>,
    ttl: Option<Duration>,
}

impl PresentationCache {
    /// Create a cache holding at most `max_entries` presentations.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl: None,
        }
    }

    /// Builder: expire entries older than `ttl`.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Return the cached presentation for `identity` if it was built from the
    /// same bytes, otherwise build, store and return a new one.
    ///
    /// A failed build stores nothing.
    pub fn get_or_build<E, F>(&self, identity: &str, bytes: &[u8], build: F) -> Result<Arc<Presentation>, E>
    where
        F: FnOnce(&[u8]) -> Result<Presentation, E>,
    {
        let fp = fingerprint(bytes);
        {
            let mut inner = self.inner.lock();
            let now = Instant::now();
            let cached = inner.entries.get(identity).map(|e| {
                let fresh = e.fingerprint == fp && !self.expired(e, now);
                (fresh, Arc::clone(&e.presentation))
            });
            match cached {
                Some((true, presentation)) => {
                    inner.hits += 1;
                    log::debug!("Cache hit for {}", identity);
                    return Ok(presentation);
                }
                Some((false, _)) => {
                    inner.entries.pop(identity);
                    log::debug!("Dropped stale cache entry for {}", identity);
                }
                None => {}
            }
            inner.misses += 1;
        }

        // Built outside the lock so other files stay available meanwhile.
        let presentation = Arc::new(build(bytes)?);

        let mut inner = self.inner.lock();
        let entry = Entry {
            fingerprint: fp,
            presentation: Arc::clone(&presentation),
            inserted: Instant::now(),
        };
        if let Some((evicted, _)) = inner.entries.push(identity.to_string(), entry) {
            if evicted != identity {
                inner.evictions += 1;
                log::debug!("Evicted {} from cache", evicted);
            }
        }
        Ok(presentation)
    }

    /// Drop one entry. Returns whether it existed.
    pub fn invalidate(&self, identity: &str) -> bool {
        self.inner.lock().entries.pop(identity).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            max_entries: inner.entries.cap().get(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    fn expired(&self, entry: &Entry, now: Instant) -> bool {
        self.ttl
            .map_or(false, |ttl| now.duration_since(entry.inserted) > ttl)
    }
}
