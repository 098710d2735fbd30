//! Internal storage implementation for the cache.
//!
//! `Db` owns the entry map and the per-key timer table behind a single async
//! mutex, so replacing a key's timer and updating its entry happen as one
//! step. Expiry timers are tokio tasks holding a `Weak` back-reference; they
//! take the same lock before acting, which is what makes aborting them under
//! the lock a real cancellation.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::{active_deadline, next_estimate, Entry, EntryState};
use crate::error::{CacheError, CacheResult};
use crate::stats::CacheStats;
use crate::timer::TimerTable;

/// When a `set` should fire the mutation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notify {
    /// Never notify.
    Never,
    /// Notify only when the key did not exist before.
    #[default]
    OnInsert,
    /// Notify even when an existing key is refreshed.
    Always,
}

impl Notify {
    /// Build from the `(notify, force)` flag pair.
    pub fn from_flags(notify: bool, force: bool) -> Self {
        match (notify, force) {
            (_, true) => Notify::Always,
            (true, false) => Notify::OnInsert,
            (false, false) => Notify::Never,
        }
    }

    pub(crate) fn fires(self, inserted: bool) -> bool {
        match self {
            Notify::Never => false,
            Notify::OnInsert => inserted,
            Notify::Always => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Deactivate,
    Evict,
}

/// Everything guarded by the lock.
#[derive(Debug)]
struct Store<K, V> {
    entries: IndexMap<K, Entry<V>>,
    timers: TimerTable<K>,
}

/// Shared state behind every `Cache` handle.
///
/// This is the internal implementation; users should use `Cache` instead.
#[derive(Debug)]
pub(crate) struct Db<K, V> {
    store: Mutex<Store<K, V>>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
    runtime: Handle,
}

impl<K, V> Db<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + 'static,
    V: Clone + Send + 'static,
{
    pub(crate) fn new(config: CacheConfig, runtime: Handle) -> Self {
        Self {
            store: Mutex::new(Store {
                entries: IndexMap::new(),
                timers: TimerTable::new(),
            }),
            config,
            stats: Arc::new(CacheStats::new()),
            runtime,
        }
    }

    pub(crate) fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub(crate) fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Write `value`, update the key's TTL estimate and reschedule its expiry.
    ///
    /// Returns `true` if the key was not present before.
    pub(crate) async fn set(self: &Arc<Self>, key: K, value: V, notify: Notify) -> bool {
        let inserted = {
            let mut guard = self.store.lock().await;
            let store = &mut *guard;
            let now = Instant::now();

            let (entry, deadline) = match store.entries.get(&key) {
                None => (
                    Entry::new(value, now),
                    active_deadline(None, self.config.default_ttl, self.config.grace_margin),
                ),
                Some(prev) => {
                    let hit_count = prev.hit_count.saturating_add(1);
                    let ttl = if self.config.adaptive_ttl {
                        Some(next_estimate(prev.ttl, prev.inserted_at, now, hit_count))
                    } else {
                        None
                    };
                    if prev.state == EntryState::Inactive {
                        debug!(?key, "inactive entry refreshed");
                        self.stats.record_resurrection();
                    }
                    let deadline = active_deadline(
                        prev.ttl,
                        self.config.default_ttl,
                        self.config.grace_margin,
                    );
                    let entry = Entry {
                        value,
                        state: EntryState::Active,
                        inserted_at: now,
                        hit_count,
                        ttl,
                    };
                    (entry, deadline)
                }
            };

            let inserted = entry.hit_count == 1;
            store.entries.insert(key.clone(), entry);
            self.schedule(store, key, Transition::Deactivate, deadline);
            self.stats.record_set(inserted);
            inserted
        };

        if notify.fires(inserted) {
            self.notify();
        }
        inserted
    }

    pub(crate) async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock().await;
        let value = store.entries.get(key).map(|entry| entry.value.clone());
        self.record_read(value.is_some());
        value
    }

    pub(crate) async fn get_entry<Q>(&self, key: &Q) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let store = self.store.lock().await;
        let entry = store.entries.get(key).cloned();
        self.record_read(entry.is_some());
        entry
    }

    pub(crate) async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.entries.contains_key(key)
    }

    /// Move `key` to the inactive phase and schedule its eviction.
    pub(crate) async fn mark_inactive<Q>(
        self: &Arc<Self>,
        key: &Q,
        notify: bool,
    ) -> CacheResult<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        {
            let mut guard = self.store.lock().await;
            self.deactivate(&mut guard, key)?;
        }
        if notify {
            self.notify();
        }
        Ok(())
    }

    /// Remove `key`, returning the entry it held.
    pub(crate) async fn delete<Q>(&self, key: &Q, notify: bool) -> Option<Entry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let removed = {
            let mut store = self.store.lock().await;
            store.timers.cancel(key);
            let removed = store.entries.swap_remove(key);
            if removed.is_some() {
                self.stats.record_delete();
            }
            removed
        };
        if removed.is_some() {
            debug!(?key, "entry deleted");
        }
        if notify {
            self.notify();
        }
        removed
    }

    pub(crate) async fn list_entries(&self) -> Vec<Entry<V>> {
        let store = self.store.lock().await;
        store.entries.values().cloned().collect()
    }

    pub(crate) async fn list_keyed(&self) -> Vec<(K, Entry<V>)> {
        let store = self.store.lock().await;
        store
            .entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    /// Cancel every timer and drop every entry under one lock acquisition.
    pub(crate) async fn clear(&self, notify: bool) {
        {
            let mut store = self.store.lock().await;
            store.timers.cancel_all();
            store.entries.clear();
            self.stats.record_clear();
        }
        debug!("cache cleared");
        if notify {
            self.notify();
        }
    }

    pub(crate) async fn len(&self) -> usize {
        self.store.lock().await.entries.len()
    }

    pub(crate) async fn pending_timers(&self) -> usize {
        self.store.lock().await.timers.len()
    }

    pub(crate) async fn has_pending_timer<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().await.timers.contains(key)
    }

    // Private helper methods

    fn record_read(&self, hit: bool) {
        if hit {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
    }

    fn notify(&self) {
        self.stats.record_notification();
        (self.config.on_mutation)();
    }

    fn deactivate<Q>(self: &Arc<Self>, store: &mut Store<K, V>, key: &Q) -> CacheResult<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let owned = match store.entries.get_full_mut(key) {
            Some((_, owned, entry)) => {
                if entry.state == EntryState::Active {
                    self.stats.record_inactivation();
                }
                entry.state = EntryState::Inactive;
                owned.clone()
            }
            None => return Err(CacheError::KeyNotFound(format!("{:?}", key))),
        };
        debug!(key = ?owned, "entry inactive");
        self.schedule(store, owned, Transition::Evict, self.config.inactive_grace);
        Ok(())
    }

    /// Spawn the timer for `key`'s next transition, replacing (and aborting)
    /// whatever timer the key had.
    fn schedule(
        self: &Arc<Self>,
        store: &mut Store<K, V>,
        key: K,
        transition: Transition,
        after: Duration,
    ) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let task_key = key.clone();
        let task = self.runtime.spawn(async move {
            time::sleep(after).await;
            if let Some(db) = weak.upgrade() {
                db.fire(task_key, transition).await;
            }
        });
        trace!(?key, ?transition, ?after, "timer scheduled");
        store.timers.replace(key, task.abort_handle());
    }

    /// Body of a timer task once its sleep has elapsed.
    async fn fire(self: Arc<Self>, key: K, transition: Transition) {
        let notify = {
            let mut guard = self.store.lock().await;
            // An abort issued while this task was already running takes
            // effect here, before anything is touched.
            tokio::task::yield_now().await;

            let store = &mut *guard;
            store.timers.release(&key);
            match transition {
                Transition::Deactivate => self.deactivate(store, &key).is_ok(),
                Transition::Evict => {
                    if store.entries.swap_remove(&key).is_some() {
                        debug!(?key, "entry evicted");
                        self.stats.record_eviction();
                    }
                    true
                }
            }
        };
        if notify {
            self.notify();
        }
    }
}
