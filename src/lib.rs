//! # Adaptive TTL Cache
//!
//! An in-memory key-value cache where each entry's time-to-live is inferred
//! from how often its key is written, and where expiry happens in two steps:
//! an entry first becomes *inactive* (stale but still readable) and is only
//! evicted after a further grace period.
//!
//! ## Features
//!
//! - **Adaptive TTL**: a per-key running mean of the intervals between writes
//! - **Two-phase expiry**: active -> inactive -> evicted, driven by per-key timers
//! - **Mutation notices**: a single callback (or channel) telling observers to re-read
//! - **Shareable**: `Cache` is `Clone` and uses `Arc` internally
//! - **Statistics**: hits, misses, inactivations, evictions and more
//!
//! ## Quick Start
//!
//! ```rust
//! use adaptive_ttl_cache::{Cache, CacheConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> adaptive_ttl_cache::CacheResult<()> {
//! let config = CacheConfig::new()
//!     .default_ttl(Duration::from_secs(10))
//!     .grace_margin(0.5)
//!     .inactive_grace(Duration::from_secs(5))
//!     .on_mutation(|| println!("programs changed, refreshing list"))
//!     .build();
//!
//! let cache = Cache::new(config)?;
//!
//! // First sight of a key notifies observers; refreshes do not.
//! cache.set("program:42".to_string(), "running").await;
//! cache.set("program:42".to_string(), "running").await;
//!
//! if let Some(entry) = cache.get_entry("program:42").await {
//!     println!("{} after {} writes", entry.state(), entry.hit_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime
//!
//! Expiry timers are tokio tasks. [`Cache::new`] must be called from within a
//! tokio runtime, or use [`Cache::with_runtime`] to pass a handle explicitly.

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod stats;

pub use cache::Cache;
pub use config::{CacheConfig, MutationHook};
pub use entry::{Entry, EntryState};
pub use error::{CacheError, CacheResult};
pub use stats::{CacheStats, StatsSnapshot};
pub use storage::Notify;

// Internal modules - not part of public API
pub(crate) mod storage;
pub(crate) mod timer;

// Text protocol used by the server and client binaries
pub mod cli;
pub mod command;
pub mod utils;

pub use cli::{Cli, ClientCommand, ServerArgs};
pub use command::Command;
pub use utils::buffer_to_array;
