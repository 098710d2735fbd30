//! Adaptive TTL cache server.
//!
//! This binary runs a TCP server that accepts cache commands from clients.

use bytes::{Bytes, BytesMut};
use clap::Parser;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    signal,
};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

use adaptive_ttl_cache::utils::{format_meta, parse_request};
use adaptive_ttl_cache::{Cache, CacheError, Command, EntryState, Notify, ServerArgs};

type Store = Cache<String, Bytes>;

/// Entry point for the cache server.
#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    fmt().with_env_filter(filter).with_target(true).init();

    let args = ServerArgs::parse();
    let (cache_config, mut notices) = args.cache.to_config().mutation_channel();
    info!(config = ?cache_config, "cache configured");

    let cache: Store = Cache::new(cache_config)?;

    // Observers re-read the cache when told something changed.
    let observer = cache.clone();
    tokio::spawn(async move {
        while notices.recv().await.is_some() {
            let entries = observer.list().await;
            let inactive = entries
                .iter()
                .filter(|(_, state)| *state == EntryState::Inactive)
                .count();
            info!(entries = entries.len(), inactive, "cache mutated");
        }
    });

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "cache server listening");

    let shutdown_cache = cache.clone();
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            let stats = shutdown_cache.stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                size = stats.size,
                evictions = stats.evictions,
                "shutting down"
            );
            std::process::exit(0);
        }
    });

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                debug!(%peer, "connection accepted");
                let cache = cache.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, cache).await {
                        warn!(%peer, error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(mut socket: TcpStream, cache: Store) -> Result<(), CacheError> {
    let mut buf = BytesMut::with_capacity(1024);

    let n = socket.read_buf(&mut buf).await?;
    if n == 0 {
        return Ok(());
    }

    let response = match parse_request(&mut buf) {
        Ok((command, args)) => process_command(command, args, &cache).await,
        Err(e) => format!("ERR {}", e),
    };

    socket.write_all(response.as_bytes()).await?;
    Ok(())
}

/// Process a parsed command and return the response.
async fn process_command(command: Command, mut args: Vec<String>, cache: &Store) -> String {
    match command {
        Command::Get => match cache.get(args[0].as_str()).await {
            Some(value) => String::from_utf8_lossy(&value).into_owned(),
            None => String::new(),
        },

        Command::Meta => match cache.get_entry(args[0].as_str()).await {
            Some(entry) => format_meta(&entry),
            None => String::new(),
        },

        Command::Has => {
            if cache.contains(args[0].as_str()).await {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }

        Command::Set | Command::Touch => {
            let value = Bytes::from(args.pop().unwrap_or_default());
            let key = args.swap_remove(0);
            let notify = if command == Command::Touch {
                Notify::Always
            } else {
                Notify::OnInsert
            };
            if cache.set_with(key, value, notify).await {
                "Ok".to_string()
            } else {
                "r Ok".to_string()
            }
        }

        Command::Inactive => match cache.mark_inactive(args[0].as_str()).await {
            Ok(()) => "Ok".to_string(),
            Err(e) => format!("ERR {}", e),
        },

        Command::Delete => match cache.delete(args[0].as_str()).await {
            Some(_) => "Ok".to_string(),
            None => String::new(),
        },

        Command::List => cache
            .list_keyed()
            .await
            .into_iter()
            .map(|(key, entry)| {
                format!(
                    "{} {} {}",
                    key,
                    entry.state(),
                    String::from_utf8_lossy(entry.value())
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),

        Command::Clear => {
            cache.clear_with(true).await;
            "Ok".to_string()
        }

        Command::Ping => "PONG".to_string(),

        Command::Stats => {
            let stats = cache.stats();
            format!(
                "hits:{} misses:{} size:{} inactivations:{} evictions:{} notifications:{} hit_rate:{:.1}%",
                stats.hits,
                stats.misses,
                stats.size,
                stats.inactivations,
                stats.evictions,
                stats.notifications,
                stats.hit_rate
            )
        }

        Command::Invalid => "ERR unknown command".to_string(),
    }
}
