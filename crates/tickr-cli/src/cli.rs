//! CLI argument definitions for tickr.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `login` / `register` / `logout` | Manage the persisted session |
//! | `whoami` | Show the signed-in user |
//! | `watchlist` | List, create, rename, delete, or show watchlists |
//! | `instrument` | Add or remove instruments in a watchlist |
//! | `search` | Debounced instrument search |
//! | `market` | Market indices and open/closed status |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--api-url` | `http://localhost:8080/api/v1` | Backend base URL |
//! | `--session-file` | `~/.tickr/session.json` | Persisted session record |
//! | `--timeout-ms` | `3000` | Request timeout in ms |
//! | `--offline` | `false` | Use the in-process demo backend |
//! | `--format` | `json` | Output format (json, table) |
//!
//! # Examples
//!
//! ```bash
//! tickr login --email arjun@tickr.io --password secret1
//! tickr watchlist create Tech
//! tickr instrument add Tech RELIANCE --reference custom --price 2800
//! tickr watchlist show Tech --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tickr - watchlists with change tracking against a reference price
#[derive(Debug, Parser)]
#[command(name = "tickr", author, version, about = "Financial watchlist CLI")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Backend base URL.
    #[arg(long, global = true, env = "TICKR_API_URL")]
    pub api_url: Option<String>,

    /// Where the session record is persisted.
    #[arg(long, global = true, env = "TICKR_SESSION_PATH")]
    pub session_file: Option<PathBuf>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true, env = "TICKR_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Use the in-process demo backend instead of the REST API.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Enable debug logging on stderr.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary followed by the data.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and persist the session.
    Login(LoginArgs),

    /// Create an account and persist the session.
    Register(RegisterArgs),

    /// Clear the persisted session.
    Logout,

    /// Show the signed-in user.
    Whoami(WhoamiArgs),

    /// Manage watchlists.
    Watchlist(WatchlistArgs),

    /// Add or remove instruments.
    Instrument(InstrumentArgs),

    /// Search instruments by ticker or name.
    ///
    /// Queries shorter than three characters are not sent.
    ///
    ///   tickr search reli
    Search(SearchArgs),

    /// Market indices and status.
    Market(MarketArgs),
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "TICKR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long, env = "TICKR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct WhoamiArgs {
    /// Ask the backend instead of reading the stored session.
    #[arg(long, default_value_t = false)]
    pub remote: bool,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    List,

    Create {
        name: String,
    },

    Rename {
        /// Watchlist id or name.
        watchlist: String,
        new_name: String,
    },

    Delete {
        /// Watchlist id or name.
        watchlist: String,
    },

    /// Show instruments with their change against the reference price.
    Show {
        /// Watchlist id or name; defaults to the first watchlist.
        watchlist: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct InstrumentArgs {
    #[command(subcommand)]
    pub command: InstrumentCommand,
}

#[derive(Debug, Subcommand)]
pub enum InstrumentCommand {
    Add(AddInstrumentArgs),

    Remove {
        /// Watchlist id or name.
        watchlist: String,
        /// Instrument id or trading symbol.
        instrument: String,
    },
}

#[derive(Debug, Args)]
pub struct AddInstrumentArgs {
    /// Watchlist id or name.
    pub watchlist: String,

    /// Trading symbol, matched exactly.
    pub symbol: String,

    #[arg(long, value_enum, default_value_t = ReferenceArg::Market)]
    pub reference: ReferenceArg,

    /// Custom reference price, required with `--reference custom`.
    #[arg(long)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReferenceArg {
    Market,
    Custom,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,

    /// Maximum number of hits.
    #[arg(long, env = "TICKR_SEARCH_PAGE_SIZE")]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    #[command(subcommand)]
    pub command: MarketCommand,
}

#[derive(Debug, Subcommand)]
pub enum MarketCommand {
    Indices,

    Status {
        /// Keep polling and print every update until interrupted.
        #[arg(long, default_value_t = false)]
        watch: bool,

        #[arg(long, env = "TICKR_MARKET_POLL_SECS")]
        interval_secs: Option<u64>,
    },
}
