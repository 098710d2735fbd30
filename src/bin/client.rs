//! Adaptive TTL cache client.
//!
//! This binary provides a CLI for interacting with a running cache server.

use bytes::BytesMut;
use clap::Parser;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

use adaptive_ttl_cache::cli::{Cli, ClientCommand};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let addr = format!("{}:{}", args.host, args.port);
    let mut stream = match TcpStream::connect(&addr).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to server at {}: {}", addr, e);
            eprintln!("Make sure the server is running with: cargo run --bin server");
            std::process::exit(1);
        }
    };

    stream.write_all(args.command.to_request().as_bytes()).await?;

    let mut buf = BytesMut::with_capacity(4096);
    while stream.read_buf(&mut buf).await? > 0 {}

    let resp = match std::str::from_utf8(&buf) {
        Ok(resp) => resp,
        Err(e) => {
            eprintln!("Failed to parse response: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(err) = resp.strip_prefix("ERR ") {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    match &args.command {
        ClientCommand::Set { key, .. } => match resp {
            "r Ok" => println!("Refreshed key '{}'", key),
            "Ok" => println!("Set key '{}'", key),
            other => println!("Response: {}", other),
        },

        ClientCommand::Get { key } | ClientCommand::Meta { key } => {
            if resp.is_empty() {
                println!("Key '{}' not found", key);
            } else {
                println!("{}", resp);
            }
        }

        ClientCommand::Inactive { key } => println!("Key '{}' is now inactive", key),

        ClientCommand::Delete { key } => match resp {
            "Ok" => println!("Deleted key '{}'", key),
            _ => println!("Key '{}' not found", key),
        },

        ClientCommand::List => {
            if resp.is_empty() {
                println!("(empty)");
            }
            for line in resp.lines() {
                println!("{}", line);
            }
        }

        ClientCommand::Clear => println!("Cache cleared"),

        ClientCommand::Ping => println!("{}", resp),

        ClientCommand::Stats => {
            println!("Cache Statistics:");
            for part in resp.split_whitespace() {
                if let Some((key, value)) = part.split_once(':') {
                    println!("  {}: {}", key, value);
                }
            }
        }
    }

    Ok(())
}
