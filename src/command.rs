//! Command types for the cache protocol.
//!
//! This module defines the commands that can be sent to the cache server.

use crate::error::{CacheError, CacheResult};

/// Types of commands supported by the cache server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key.
    Get,
    /// Get a key's state and TTL metadata.
    Meta,
    /// Check whether a key is present.
    Has,
    /// Set a key-value pair, notifying only for new keys.
    Set,
    /// Set a key-value pair and always notify.
    Touch,
    /// Move a key to the inactive phase.
    Inactive,
    /// Delete a key.
    Delete,
    /// List every entry with its state.
    List,
    /// Remove every entry.
    Clear,
    /// Ping the server (health check).
    Ping,
    /// Get server statistics.
    Stats,
    /// Invalid or unknown command.
    Invalid,
}

impl Command {
    /// Parse a command from a string (case-insensitive).
    ///
    /// Returns `Command::Invalid` for unknown commands.
    pub fn get(s: &str) -> Command {
        match s.to_lowercase().as_str() {
            "get" => Command::Get,
            "meta" => Command::Meta,
            "has" | "exists" => Command::Has,
            "set" => Command::Set,
            "touch" => Command::Touch,
            "inactive" => Command::Inactive,
            "delete" | "del" => Command::Delete,
            "list" | "ls" => Command::List,
            "clear" => Command::Clear,
            "ping" => Command::Ping,
            "stats" | "info" => Command::Stats,
            _ => Command::Invalid,
        }
    }

    /// Parse a command from a string, returning an error for invalid commands.
    pub fn parse(s: &str) -> CacheResult<Command> {
        let cmd = Self::get(s);
        if cmd == Command::Invalid {
            Err(CacheError::InvalidCommand(s.to_string()))
        } else {
            Ok(cmd)
        }
    }

    /// Number of arguments the command takes after its name.
    pub fn arity(&self) -> usize {
        match self {
            Command::Set | Command::Touch => 2,
            Command::Get | Command::Meta | Command::Has | Command::Inactive | Command::Delete => 1,
            Command::List | Command::Clear | Command::Ping | Command::Stats | Command::Invalid => 0,
        }
    }

    /// Get the string representation of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::Meta => "meta",
            Command::Has => "has",
            Command::Set => "set",
            Command::Touch => "touch",
            Command::Inactive => "inactive",
            Command::Delete => "delete",
            Command::List => "list",
            Command::Clear => "clear",
            Command::Ping => "ping",
            Command::Stats => "stats",
            Command::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
