//! The main cache interface.
//!
//! This module provides the primary `Cache` type that users interact with.
//! It wraps the internal storage and provides a clean, clonable async API.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::config::CacheConfig;
use crate::entry::{Entry, EntryState};
use crate::error::{CacheError, CacheResult};
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::{Db, Notify};

/// An in-memory cache whose entries expire in two phases on a per-key,
/// self-tuning schedule.
///
/// Every `set` (re)starts a timer for the key. When it lapses the entry turns
/// [`EntryState::Inactive`] but stays readable; after the configured inactive
/// grace it is evicted. In adaptive mode the timer length follows the running
/// mean of the intervals between writes to that key.
///
/// Cloning a `Cache` creates a new handle to the same underlying data. Timers
/// run on the tokio runtime the cache was created in; dropping the last handle
/// cancels all of them.
///
/// # Example
/// ```
/// use adaptive_ttl_cache::{Cache, CacheConfig, EntryState};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> adaptive_ttl_cache::CacheResult<()> {
/// let config = CacheConfig::new()
///     .default_ttl(Duration::from_secs(30))
///     .build();
/// let cache = Cache::new(config)?;
///
/// cache.set("sensor:1", 21.5).await;
/// assert_eq!(cache.get("sensor:1").await, Some(21.5));
///
/// cache.mark_inactive("sensor:1").await?;
/// let entry = cache.get_entry("sensor:1").await.unwrap();
/// assert_eq!(entry.state(), EntryState::Inactive);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Cache<K, V> {
    db: Arc<Db<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Create a new cache whose timers run on the current tokio runtime.
    ///
    /// Fails with [`CacheError::NoRuntime`] when called outside a runtime.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create a new cache whose timers run on the given runtime.
    pub fn with_runtime(config: CacheConfig, runtime: Handle) -> Self {
        Self {
            db: Arc::new(Db::new(config, runtime)),
        }
    }

    /// Store a value, notifying observers only if the key is new.
    ///
    /// The entry becomes active and its expiry timer is restarted. With
    /// adaptive TTL enabled, the time since the previous write feeds the key's
    /// TTL estimate. Returns `true` if the key was newly inserted.
    pub async fn set(&self, key: K, value: V) -> bool {
        self.db.set(key, value, Notify::OnInsert).await
    }

    /// Store a value with explicit notification behaviour.
    ///
    /// ```
    /// use adaptive_ttl_cache::{Cache, CacheConfig, Notify};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> adaptive_ttl_cache::CacheResult<()> {
    /// let (config, mut notices) = CacheConfig::new().mutation_channel();
    /// let cache = Cache::new(config)?;
    ///
    /// cache.set("job", "running").await;
    /// cache.set("job", "still running").await;
    /// cache.set_with("job", "deleting...", Notify::Always).await;
    ///
    /// let mut seen = 0;
    /// while notices.try_recv().is_ok() {
    ///     seen += 1;
    /// }
    /// assert_eq!(seen, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_with(&self, key: K, value: V, notify: Notify) -> bool {
        self.db.set(key, value, notify).await
    }

    /// Get a value, whether its entry is active or inactive.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.get(key).await
    }

    /// Get a copy of the full entry, including state and TTL metadata.
    pub async fn get_entry<Q>(&self, key: &Q) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.get_entry(key).await
    }

    /// Check whether a key is present. Inactive entries count.
    pub async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.contains(key).await
    }

    /// Force a key into the inactive phase and notify observers.
    ///
    /// Its eviction is scheduled after the inactive grace period. Returns
    /// [`CacheError::KeyNotFound`] if the key is absent.
    pub async fn mark_inactive<Q>(&self, key: &Q) -> CacheResult<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.db.mark_inactive(key, true).await
    }

    /// Like [`mark_inactive`](Self::mark_inactive), with control over notification.
    pub async fn mark_inactive_with<Q>(&self, key: &Q, notify: bool) -> CacheResult<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.db.mark_inactive(key, notify).await
    }

    /// Remove a key and return its value. Observers are notified.
    ///
    /// Deleting an absent key returns `None` and is not an error.
    pub async fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.db.delete(key, true).await.map(Entry::into_value)
    }

    /// Remove a key and return its full entry.
    pub async fn delete_entry<Q>(&self, key: &Q, notify: bool) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.db.delete(key, notify).await
    }

    /// Snapshot of every value paired with its entry state.
    pub async fn list(&self) -> Vec<(V, EntryState)> {
        self.db
            .list_entries()
            .await
            .into_iter()
            .map(|entry| (entry.value, entry.state))
            .collect()
    }

    /// Snapshot of every value.
    pub async fn list_values(&self) -> Vec<V> {
        self.db
            .list_entries()
            .await
            .into_iter()
            .map(Entry::into_value)
            .collect()
    }

    /// Snapshot of every entry with its metadata.
    pub async fn list_entries(&self) -> Vec<Entry<V>> {
        self.db.list_entries().await
    }

    /// Snapshot of every key with its entry.
    pub async fn list_keyed(&self) -> Vec<(K, Entry<V>)> {
        self.db.list_keyed().await
    }

    /// Remove all entries and cancel all timers, without notifying.
    pub async fn clear(&self) {
        self.db.clear(false).await;
    }

    /// Remove all entries and cancel all timers.
    pub async fn clear_with(&self, notify: bool) {
        self.db.clear(notify).await;
    }

    /// Number of entries, active and inactive.
    pub async fn len(&self) -> usize {
        self.db.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of scheduled transitions. Never exceeds [`len`](Self::len).
    pub async fn pending_timers(&self) -> usize {
        self.db.pending_timers().await
    }

    /// Whether a transition is scheduled for `key`.
    pub async fn has_pending_timer<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.db.has_pending_timer(key).await
    }

    pub fn config(&self) -> &CacheConfig {
        self.db.config()
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.db.stats().snapshot()
    }

    /// Get a reference to the internal statistics counter.
    ///
    /// This is useful for integrating with external metrics systems.
    pub fn stats_ref(&self) -> Arc<CacheStats> {
        self.db.stats()
    }
}
