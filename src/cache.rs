//! In-process cache for fetched pages
//!
//! Keyed by the serialized query parameters. Entries expire a fixed window
//! after they were written; expired entries behave exactly like misses. There
//! is no capacity bound: the key space is the set of pages a user browses in
//! one session.
//!
//! Lookups are not atomic with the fetch that fills them. Two concurrent
//! fetches for the same key can both miss and both `put`; the later write
//! wins, which is harmless because entries are snapshots of read-only
//! upstream state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::constants::cache::EXPIRATION_SECS;
use crate::debug::{self, cat};

/// Time source, injectable so tests can move time forward
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and replay
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Cached payload with its fetch time
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub fetched_at_ms: i64,
    pub value: V,
}

/// Hit/miss counters for the debug panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub entries: usize,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    expired: u64,
}

/// Time-expiring key → value store
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Cache with the default 5-minute expiration and the system clock
    pub fn new() -> Self {
        Self::with_clock(Duration::from_secs(EXPIRATION_SECS), Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                expired: 0,
            }),
            ttl_ms: ttl.as_millis() as i64,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms as u64)
    }

    /// Cached value if present and `now - fetched_at < ttl`
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        let mut guard = self.inner.lock().ok()?;
        let inner = &mut *guard;

        let fresh = match inner.entries.get(key) {
            Some(e) if now - e.fetched_at_ms < self.ttl_ms => Some(e.value.clone()),
            Some(_) => {
                inner.entries.remove(key);
                inner.expired += 1;
                None
            }
            None => None,
        };

        if fresh.is_some() {
            inner.hits += 1;
            debug::log(cat::CACHE, format!("hit {key}"));
        } else {
            inner.misses += 1;
            debug::log(cat::CACHE, format!("miss {key}"));
        }
        fresh
    }

    /// Store `value` under `key`, stamped with the current time
    pub fn put(&self, key: impl Into<String>, value: V) {
        let fetched_at_ms = self.clock.now_ms();
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.insert(
                key.into(),
                CacheEntry {
                    fetched_at_ms,
                    value,
                },
            );
        }
    }

    /// Drop one key, or every key when `key` is `None`
    pub fn invalidate(&self, key: Option<&str>) {
        if let Ok(mut inner) = self.inner.lock() {
            match key {
                Some(k) => {
                    inner.entries.remove(k);
                    debug::log(cat::CACHE, format!("invalidate {k}"));
                }
                None => {
                    inner.entries.clear();
                    debug::log(cat::CACHE, "invalidate all");
                }
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .map(|i| CacheStats {
                hits: i.hits,
                misses: i.misses,
                expired: i.expired,
                entries: i.entries.len(),
            })
            .unwrap_or_default()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
