//! Cache entry with lifecycle state and TTL bookkeeping.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::CacheError;

/// Lifecycle phase of an entry.
///
/// Entries only ever move `Active -> Inactive -> (evicted)`. A write to an
/// inactive entry brings it back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Written recently enough that its deadline has not lapsed.
    Active,
    /// Deadline lapsed; still readable until the inactive grace period ends.
    Inactive,
}

impl EntryState {
    /// Get the string representation of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryState::Active => "active",
            EntryState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryState {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EntryState::Active),
            "inactive" => Ok(EntryState::Inactive),
            other => Err(CacheError::ParseError(format!(
                "unknown entry state '{}'",
                other
            ))),
        }
    }
}

/// A single cache entry: the stored value plus its lifecycle metadata.
///
/// Returned by the `*_entry` accessors of [`Cache`](crate::Cache) as a
/// point-in-time copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    pub(crate) value: V,
    pub(crate) state: EntryState,

    /// Time of the most recent write.
    pub(crate) inserted_at: Instant,

    /// Number of writes seen since the key was first inserted (always >= 1).
    pub(crate) hit_count: u64,

    /// Current TTL estimate. Only present in adaptive mode after the second write.
    pub(crate) ttl: Option<Duration>,
}

impl<V> Entry<V> {
    /// Create a fresh entry for a key seen for the first time.
    pub(crate) fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            state: EntryState::Active,
            inserted_at: now,
            hit_count: 1,
            ttl: None,
        }
    }

    /// Get a reference to the value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consume the entry, returning its value.
    pub fn into_value(self) -> V {
        self.value
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EntryState::Active
    }

    /// Time of the most recent write.
    pub fn inserted_at(&self) -> Instant {
        self.inserted_at
    }

    /// Number of writes observed for this key.
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// The adaptive TTL estimate, if one has been computed.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}

/// Time an entry may stay active: its estimate (or the default when there is
/// none) stretched by the grace margin.
///
/// A zero estimate counts as no estimate.
pub(crate) fn active_deadline(
    ttl: Option<Duration>,
    default_ttl: Duration,
    margin: f64,
) -> Duration {
    let base = ttl.filter(|t| !t.is_zero()).unwrap_or(default_ttl);
    Duration::try_from_secs_f64(base.as_secs_f64() * (1.0 + margin)).unwrap_or(Duration::MAX)
}

/// Incremental mean: `estimate - estimate / n + sample / n`.
pub(crate) fn running_mean(estimate: Duration, sample: Duration, n: u64) -> Duration {
    let n = n.max(1) as f64;
    let est = estimate.as_secs_f64();
    let next = est - est / n + sample.as_secs_f64() / n;
    Duration::try_from_secs_f64(next).unwrap_or(estimate)
}

/// Estimate to store on a write at `now`, given the previous entry's
/// estimate and write time. `hit_count` is the count including this write.
pub(crate) fn next_estimate(
    prior_ttl: Option<Duration>,
    prior_inserted_at: Instant,
    now: Instant,
    hit_count: u64,
) -> Duration {
    let sample = now.saturating_duration_since(prior_inserted_at);
    match prior_ttl.filter(|t| !t.is_zero()) {
        None => sample,
        Some(estimate) => running_mean(estimate, sample, hit_count),
    }
}
