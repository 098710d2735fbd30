//! Configuration for the adaptive TTL cache.
//!
//! This module provides a builder pattern for configuring how long entries
//! stay active, whether their TTL adapts to the observed write interval, how
//! long they linger once inactive, and who gets told about mutations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

/// Callback fired when the cache changes in a way observers opted into.
///
/// The hook carries no payload: it is a "something changed, re-read" signal.
pub type MutationHook = Arc<dyn Fn() + Send + Sync>;

const DEFAULT_TTL: Duration = Duration::from_secs(10);
const DEFAULT_GRACE_MARGIN: f64 = 0.5;
const DEFAULT_INACTIVE_GRACE: Duration = Duration::from_secs(5);

/// Configuration for creating a new cache instance.
///
/// Use the builder pattern to construct configuration:
///
/// ```
/// use adaptive_ttl_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new()
///     .default_ttl(Duration::from_millis(500))
///     .adaptive_ttl(false)
///     .on_mutation(|| println!("cache changed"))
///     .build();
///
/// assert_eq!(config.get_default_ttl(), Duration::from_millis(500));
/// ```
#[derive(Clone)]
pub struct CacheConfig {
    /// TTL used before a key has an estimate, and always when adaptation is off.
    pub(crate) default_ttl: Duration,

    /// Whether each key's TTL is estimated from the interval between its writes.
    pub(crate) adaptive_ttl: bool,

    /// Extra fraction of the TTL allowed before an entry turns inactive.
    pub(crate) grace_margin: f64,

    /// How long an inactive entry survives before it is evicted.
    pub(crate) inactive_grace: Duration,

    pub(crate) on_mutation: MutationHook,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            adaptive_ttl: true,
            grace_margin: DEFAULT_GRACE_MARGIN,
            inactive_grace: DEFAULT_INACTIVE_GRACE,
            on_mutation: Arc::new(|| tracing::debug!("ttl cache mutated")),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("default_ttl", &self.default_ttl)
            .field("adaptive_ttl", &self.adaptive_ttl)
            .field("grace_margin", &self.grace_margin)
            .field("inactive_grace", &self.inactive_grace)
            .finish_non_exhaustive()
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL used until a key has been written twice.
    ///
    /// With adaptation disabled this is the TTL of every entry.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enable or disable the per-key TTL estimate.
    pub fn adaptive_ttl(mut self, enabled: bool) -> Self {
        self.adaptive_ttl = enabled;
        self
    }

    /// Set the slack applied to the TTL before an entry becomes inactive.
    ///
    /// `0.5` means an entry turns inactive after 150% of its TTL. Values are
    /// clamped to `[0, 1]`; NaN falls back to the default.
    pub fn grace_margin(mut self, margin: f64) -> Self {
        self.grace_margin = if margin.is_nan() {
            DEFAULT_GRACE_MARGIN
        } else {
            margin.clamp(0.0, 1.0)
        };
        self
    }

    /// Set how long an inactive entry stays readable before eviction.
    pub fn inactive_grace(mut self, grace: Duration) -> Self {
        self.inactive_grace = grace;
        self
    }

    /// Install the mutation callback.
    ///
    /// The callback runs after the cache has released its lock, so it may
    /// hand work off to tasks that call back into the cache.
    pub fn on_mutation<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_mutation = Arc::new(hook);
        self
    }

    /// Route mutation notices into an unbounded channel instead of a callback.
    ///
    /// Returns the updated configuration and the receiving end. Notices sent
    /// after the receiver is dropped are discarded.
    pub fn mutation_channel(self) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = self.on_mutation(move || {
            let _ = tx.send(());
        });
        (config, rx)
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the default TTL.
    pub fn get_default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Whether adaptive TTL estimation is enabled.
    pub fn is_adaptive(&self) -> bool {
        self.adaptive_ttl
    }

    /// Get the grace margin.
    pub fn get_grace_margin(&self) -> f64 {
        self.grace_margin
    }

    /// Get the inactive grace period.
    pub fn get_inactive_grace(&self) -> Duration {
        self.inactive_grace
    }
}
