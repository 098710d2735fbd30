//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the cache server and client using clap.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::CacheConfig;

/// Adaptive TTL cache server.
#[derive(Parser, Debug)]
#[command(name = "cache-server")]
#[command(author, version, about, long_about = None)]
pub struct ServerArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    #[command(flatten)]
    pub cache: CacheArgs,
}

/// Cache tuning flags shared by anything that builds a `CacheConfig`.
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// TTL in milliseconds used until a key has an estimate.
    #[arg(long, default_value_t = 10_000)]
    pub default_ttl_ms: u64,

    /// Use the default TTL for every key instead of estimating it.
    #[arg(long)]
    pub fixed_ttl: bool,

    /// Extra fraction of the TTL before an entry becomes inactive.
    #[arg(long, default_value_t = 0.5)]
    pub grace_margin: f64,

    /// Milliseconds an inactive entry survives before eviction.
    #[arg(long, default_value_t = 5_000)]
    pub inactive_grace_ms: u64,
}

impl CacheArgs {
    /// Translate the flags into a cache configuration.
    pub fn to_config(&self) -> CacheConfig {
        CacheConfig::new()
            .default_ttl(Duration::from_millis(self.default_ttl_ms))
            .adaptive_ttl(!self.fixed_ttl)
            .grace_margin(self.grace_margin)
            .inactive_grace(Duration::from_millis(self.inactive_grace_ms))
            .build()
    }
}

/// Adaptive TTL cache client.
///
/// A CLI tool for interacting with the cache server.
#[derive(Parser, Debug)]
#[command(name = "cache-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server address.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port.
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// The command to execute.
    #[command(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Get a value by key.
    ///
    /// Inactive entries are still returned until they are evicted.
    Get {
        /// The key to look up.
        key: String,
    },

    /// Show a key's state, write count and TTL estimate.
    Meta {
        /// The key to inspect.
        key: String,
    },

    /// Set a key-value pair.
    ///
    /// Refreshes the key's TTL. Observers are only notified for new keys
    /// unless `--force` is given.
    Set {
        /// The key to store the value under.
        key: String,
        /// The value to store.
        value: String,
        /// Notify observers even if the key already exists.
        #[arg(long)]
        force: bool,
    },

    /// Move a key to the inactive phase.
    Inactive {
        /// The key to deactivate.
        key: String,
    },

    /// Delete a key.
    Delete {
        /// The key to delete.
        key: String,
    },

    /// List every entry with its state.
    List,

    /// Remove every entry.
    Clear,

    /// Ping the server.
    Ping,

    /// Get server statistics.
    Stats,
}

impl ClientCommand {
    /// Render the request line sent to the server.
    pub fn to_request(&self) -> String {
        match self {
            ClientCommand::Get { key } => format!("get {}", key),
            ClientCommand::Meta { key } => format!("meta {}", key),
            ClientCommand::Set { key, value, force } => {
                let verb = if *force { "touch" } else { "set" };
                format!("{} {} {}", verb, key, value)
            }
            ClientCommand::Inactive { key } => format!("inactive {}", key),
            ClientCommand::Delete { key } => format!("delete {}", key),
            ClientCommand::List => "list".to_string(),
            ClientCommand::Clear => "clear".to_string(),
            ClientCommand::Ping => "ping".to_string(),
            ClientCommand::Stats => "stats".to_string(),
        }
    }
}
