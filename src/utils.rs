//! Utility functions for request parsing and reply formatting.

use std::time::Duration;

use bytes::BytesMut;

use crate::command::Command;
use crate::entry::Entry;
use crate::error::{CacheError, CacheResult};

/// Split a request buffer into space-separated words, consuming it.
///
/// Runs of whitespace count as a single separator. Invalid UTF-8 is replaced
/// rather than rejected.
///
/// # Example
/// ```
/// use adaptive_ttl_cache::buffer_to_array;
/// use bytes::BytesMut;
///
/// let mut buf = BytesMut::from("set  key value\n");
/// assert_eq!(buffer_to_array(&mut buf), vec!["set", "key", "value"]);
/// assert!(buf.is_empty());
/// ```
pub fn buffer_to_array(buf: &mut BytesMut) -> Vec<String> {
    let raw = buf.split();
    String::from_utf8_lossy(&raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Parse a request into its command and arguments.
///
/// The value of `set`/`touch` may contain spaces; every word after the key is
/// joined back into it.
pub fn parse_request(buf: &mut BytesMut) -> CacheResult<(Command, Vec<String>)> {
    let mut parts = buffer_to_array(buf);
    if parts.is_empty() {
        return Err(CacheError::ParseError("empty command".to_string()));
    }

    let name = parts.remove(0);
    let command = Command::parse(&name)?;
    let arity = command.arity();

    if parts.len() < arity {
        return Err(CacheError::ParseError(format!(
            "{} expects {} argument(s), got {}",
            command,
            arity,
            parts.len()
        )));
    }
    if arity == 2 && parts.len() > 2 {
        let value = parts.split_off(1).join(" ");
        parts.push(value);
    }
    parts.truncate(arity);

    Ok((command, parts))
}

/// Render an entry's metadata as `state:<s> hits:<n> ttl_ms:<ms|->`.
pub fn format_meta<V>(entry: &Entry<V>) -> String {
    format!(
        "state:{} hits:{} ttl_ms:{}",
        entry.state(),
        entry.hit_count(),
        format_ms(entry.ttl())
    )
}

fn format_ms(d: Option<Duration>) -> String {
    match d {
        Some(d) => d.as_millis().to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_buffer_to_array_basic() {
        let mut buf = BytesMut::from("set key value");
        let result = buffer_to_array(&mut buf);
        assert_eq!(result, vec!["set", "key", "value"]);
    }

    #[test]
    fn test_buffer_to_array_empty() {
        let mut buf = BytesMut::new();
        assert!(buffer_to_array(&mut buf).is_empty());
    }

    #[test]
    fn test_parse_request_joins_value() {
        let mut buf = BytesMut::from("set job deleting now ");
        let (command, args) = parse_request(&mut buf).unwrap();
        assert_eq!(command, Command::Set);
        assert_eq!(args, vec!["job", "deleting now"]);
    }

    #[test]
    fn test_parse_request_drops_extra_args() {
        let mut buf = BytesMut::from("get key extra");
        let (command, args) = parse_request(&mut buf).unwrap();
        assert_eq!(command, Command::Get);
        assert_eq!(args, vec!["key"]);
    }

    #[test]
    fn test_parse_request_errors() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            parse_request(&mut buf),
            Err(CacheError::ParseError(_))
        ));

        let mut buf = BytesMut::from("inactive");
        assert!(matches!(
            parse_request(&mut buf),
            Err(CacheError::ParseError(_))
        ));

        let mut buf = BytesMut::from("frobnicate x");
        assert!(matches!(
            parse_request(&mut buf),
            Err(CacheError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_format_meta() {
        let mut entry = Entry::new("v", Instant::now());
        assert_eq!(format_meta(&entry), "state:active hits:1 ttl_ms:-");

        entry.hit_count = 3;
        entry.ttl = Some(Duration::from_millis(250));
        assert_eq!(format_meta(&entry), "state:active hits:3 ttl_ms:250");
    }
}
