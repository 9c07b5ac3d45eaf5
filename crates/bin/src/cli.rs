//! CLI argument definitions for the Sealnote binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, durable)
    Sqlite,
    /// In-memory storage (for development and tests; data is lost on exit)
    Memory,
}

/// Sealnote encrypted note-storage server
#[derive(Parser, Debug)]
#[command(name = "sealnote")]
#[command(about = "Sealnote: authenticated note storage with envelope encryption")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Sealnote server
    Serve(ServeArgs),
    /// Check health of a running Sealnote server
    Health(HealthArgs),
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "SEALNOTE_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "SEALNOTE_HOST")]
    pub host: String,

    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "SEALNOTE_BACKEND")]
    pub backend: Backend,

    /// Data directory for the SQLite database file (sealnote.db)
    #[arg(short = 'D', long, env = "SEALNOTE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign bearer tokens (at least 32 bytes)
    #[arg(long, env = "SEALNOTE_SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: String,

    /// Master key material for wrapping data keys (at least 32 bytes)
    #[arg(long, env = "SEALNOTE_MASTER_KEY", hide_env_values = true)]
    pub master_key: String,

    /// Requests admitted per rate-limit window on the auth endpoints
    #[arg(long, default_value_t = 10, env = "SEALNOTE_RATE_LIMIT")]
    pub rate_limit: u32,

    /// Rate-limit window length in seconds
    #[arg(long, default_value_t = 60, env = "SEALNOTE_RATE_WINDOW")]
    pub rate_window: u64,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Port of the server to check
    #[arg(short, long, default_value_t = 3000, env = "SEALNOTE_PORT")]
    pub port: u16,

    /// Host of the server to check
    #[arg(long, default_value = "127.0.0.1", env = "SEALNOTE_HOST")]
    pub host: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}
