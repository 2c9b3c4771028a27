//! Read-mostly, time-bounded cache for the resolved universe.
//!
//! Readers load an `Arc` snapshot without locking; a writer swaps in a new
//! snapshot atomically. An entry older than the TTL reads as absent.
//!
//! The cache is an explicit object built once per process and passed to the
//! code that needs it; there is no global instance.

use std::{sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use tokio::time::Instant;

struct Entry<T> {
    value: Arc<T>,
    stored_at: Instant,
}

/// A single value that expires `ttl` after it was stored.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: ArcSwapOption<Entry<T>>,
}

impl<T> TtlCache<T> {
    /// Creates an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: ArcSwapOption::const_empty(),
        }
    }

    /// The cached value if it is still fresh.
    pub fn get(&self) -> Option<Arc<T>> {
        let guard = self.slot.load();
        let entry = (*guard).as_ref()?;
        (entry.stored_at.elapsed() < self.ttl).then(|| Arc::clone(&entry.value))
    }

    /// Stores `value`, replacing any previous entry, and returns the new snapshot.
    pub fn insert(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.slot.store(Some(Arc::new(Entry {
            value: Arc::clone(&value),
            stored_at: Instant::now(),
        })));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(3600));
        assert!(cache.get().is_none());

        cache.insert(vec!["AAPL".to_string()]);
        assert_eq!(cache.get().as_deref(), Some(&vec!["AAPL".to_string()]));

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(cache.get().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn insert_replaces_and_refreshes() {
        let cache = TtlCache::new(Duration::from_secs(10));
        cache.insert(1);
        tokio::time::advance(Duration::from_secs(8)).await;
        let fresh = cache.insert(2);
        assert_eq!(*fresh, 2);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get().as_deref(), Some(&2));
    }
}
