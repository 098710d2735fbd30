//! Per-key table of pending expiry timers.
//!
//! Each key owns at most one scheduled transition. Timers are tokio tasks and
//! are cancelled through their `AbortHandle`, so a replaced timer is torn down
//! rather than left to wake up and find it has nothing to do.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tokio::task::AbortHandle;

#[derive(Debug)]
pub(crate) struct TimerTable<K> {
    handles: HashMap<K, AbortHandle>,
}

impl<K: Hash + Eq> TimerTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            handles: HashMap::new(),
        }
    }

    /// Install `handle` as the only timer for `key`, aborting any previous one.
    pub(crate) fn replace(&mut self, key: K, handle: AbortHandle) {
        if let Some(old) = self.handles.insert(key, handle) {
            old.abort();
        }
    }

    /// Abort and forget the timer for `key`. Returns whether one was pending.
    pub(crate) fn cancel<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.handles.remove(key) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forget the timer for `key` without aborting it.
    ///
    /// A firing timer task deregisters itself this way once it holds the cache
    /// lock; aborting its own handle would cancel it at its next await.
    pub(crate) fn release<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handles.remove(key);
    }

    /// Abort every pending timer.
    pub(crate) fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.handles.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}

impl<K> Drop for TimerTable<K> {
    fn drop(&mut self) {
        for handle in self.handles.values() {
            handle.abort();
        }
    }
}
