//! kvpipe CLI Client
//!
//! Command-line interface for issuing single commands to a server.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use kvpipe::{Config, Connection, KvPipeError};

/// kvpipe CLI
#[derive(Parser, Debug)]
#[command(name = "kvpipe-cli")]
#[command(about = "CLI client for a key-value store")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "6379")]
    port: u16,

    /// Connect/read timeout in milliseconds
    #[arg(short, long, default_value = "2000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Ping the server
    Ping,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,kvpipe=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .timeout(Duration::from_millis(args.timeout_ms))
        .build();

    let mut conn = Connection::with_config(config);

    if let Err(e) = run(&mut conn, args.command) {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }

    let _ = conn.disconnect();
}

fn run(conn: &mut Connection, command: Commands) -> kvpipe::Result<()> {
    match command {
        Commands::Get { key } => {
            conn.send("GET", &[key.as_bytes()])?;
            match conn.receive_bulk()? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
        }
        Commands::Set { key, value } => {
            conn.send("SET", &[key.as_bytes(), value.as_bytes()])?;
            match conn.receive_status()? {
                Some(status) => println!("{}", status),
                None => println!("(nil)"),
            }
        }
        Commands::Del { key } => {
            conn.send("DEL", &[key.as_bytes()])?;
            println!("{}", conn.receive_integer()?);
        }
        Commands::Ping => {
            conn.send("PING", &[])?;
            match conn.receive_status() {
                Ok(Some(status)) => println!("{}", status),
                Ok(None) => println!("(nil)"),
                Err(KvPipeError::Reply(message)) => println!("(error) {}", message),
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}
