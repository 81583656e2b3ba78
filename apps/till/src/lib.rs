//! # Kirana Till
//!
//! Command-line till for a kirana shop: pricing, lookups, sales and the
//! customer book, all working on the shop's own files.
//!
//! ## Module Organization
//! ```text
//! kirana_till/
//! ├── lib.rs          ◄─── You are here (run & logging setup)
//! ├── cli.rs          ◄─── clap command definitions
//! ├── config.rs       ◄─── till.toml + KIRANA_* environment overrides
//! ├── state.rs        ◄─── Shop session (config, engine, files, clock)
//! ├── commands/       ◄─── one module per command group
//! └── error.rs        ◄─── AppError / ConfigError and exit codes
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr, `RUST_LOG`)
//! 2. Parse the command line
//! 3. Load config: defaults ◄── till.toml ◄── environment ◄── flags
//! 4. Open the shop (pricing engine, data files)
//! 5. Run the command, printing to stdout

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::io::Write;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};
use config::ShopConfig;
use error::AppResult;
use state::Shop;

/// Runs a parsed command line, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> AppResult<()> {
    // Init must work before any config file exists.
    if let Command::Config(ConfigCommand::Init { force }) = cli.command {
        return commands::config::init(cli.config, force, out);
    }

    let mut config = ShopConfig::load(cli.config)?;
    if let Some(dir) = cli.data_dir {
        config.files.data_dir = Some(dir);
    }
    debug!(command = ?cli.command, "Running command");

    let shop = Shop::open(config)?;
    commands::dispatch(&shop, cli.command, out)
}

/// Initializes the tracing subscriber. Logs go to stderr so command output
/// stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kirana_store=trace` - Trace file access only
/// - Default: warnings, plus info from the kirana crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,kirana_core=info,kirana_store=info,kirana_till=info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
