//! Error types for the adaptive TTL cache.
//!
//! The cache itself performs no I/O, so most of its operations report absence
//! through `Option`. Errors are reserved for misuse (transitioning a key that
//! does not exist, constructing a cache outside a runtime) and for the I/O of
//! the bundled server and client.

use std::fmt;
use std::io;

/// The main error type for cache operations.
#[derive(Debug)]
pub enum CacheError {
    /// The requested key was not found in the cache.
    KeyNotFound(String),

    /// The cache was created outside of a tokio runtime, so expiry timers
    /// have nowhere to run.
    NoRuntime,

    /// The command received was invalid or malformed.
    InvalidCommand(String),

    /// Failed to parse the input buffer or protocol message.
    ParseError(String),

    /// An I/O error occurred (network, file, etc.).
    IoError(io::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::KeyNotFound(key) => write!(f, "key not found: '{}'", key),
            CacheError::NoRuntime => write!(f, "no tokio runtime available for expiry timers"),
            CacheError::InvalidCommand(cmd) => write!(f, "invalid command: '{}'", cmd),
            CacheError::ParseError(msg) => write!(f, "parse error: {}", msg),
            CacheError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CacheError {
    fn from(err: io::Error) -> Self {
        CacheError::IoError(err)
    }
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
