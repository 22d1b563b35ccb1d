//! sqldeck: a browser SQL workbench for MySQL.
//!
//! One binary serves both halves: an embedded web UI (connect form, query
//! editor, history, paged results) and the JSON gateway the UI talks to. The
//! gateway holds at most one pooled connection at a time and forwards query
//! text to it unmodified, so whatever the database says, rows or an error
//! message, is what the browser shows.
//!
//! Configuration comes from the environment; a `.env` file is honored.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `DB_HOST` | `localhost` | MySQL host |
//! | `DB_PORT` | `3306` | MySQL port |
//! | `DB_USER` | `root` | MySQL user |
//! | `DB_PASSWORD` | empty | MySQL password |
//! | `PORT` | `5001` | HTTP listen port |
//! | `READ_ONLY` | off | forward only read statements |
//! | `MAX_ROWS` | `10000` | per-query response row cap, `0` = unlimited |

use thiserror::Error;

pub mod config;
pub mod connection;
pub mod driver_mysql;
pub mod export;
pub mod frontend;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod query_tools;
pub mod server;

/// Everything a request can fail with. The wire shape is always
/// `{"success": false, "error": "..."}`; the variant only decides the status
/// code and, for connect failures, the message prefix.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request rejected before any database work (blank input, read-only guard).
    #[error("{0}")]
    Invalid(String),
    /// A query arrived while the connection slot is empty.
    #[error("No database connection established. Please connect first.")]
    NotConnected,
    /// Pool construction or its eager ping failed.
    #[error("Failed to connect to database: {0}")]
    Connect(String),
    /// The database rejected the statement.
    #[error("{0}")]
    Query(String),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Process bootstrap shared by `main`: env file, logging, config, serve.
pub async fn run() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _ = env_logger::Builder::from_default_env()
        // Debug-level logs for our crate so connection and query events show up
        .filter_module("sqldeck", log::LevelFilter::Debug)
        .is_test(false)
        .try_init();

    let config = config::GatewayConfig::from_env();
    log::info!(
        "sqldeck {} starting on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );
    server::serve(config).await
}
