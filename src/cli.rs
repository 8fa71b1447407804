// src/cli.rs
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "noaa-alerts", version, about = "Watches the NOAA alert feed and pushes county matches")]
pub struct Args {
    /// Run a single fetch pass and exit instead of scheduling
    #[arg(long)]
    pub once: bool,

    /// Delete all stored alerts instead of the expiry GC (implies --once)
    #[arg(long)]
    pub purge: bool,

    /// Disable outgoing push notifications
    #[arg(long)]
    pub nopush: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// TOML configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Watched-counties JSON file
    #[arg(long, default_value = "counties.json")]
    pub counties: PathBuf,

    /// Directory for rendered detail pages
    #[arg(long, default_value = "output")]
    pub output: PathBuf,

    /// SQLite database file
    #[arg(long, default_value = "data/alerts.db")]
    pub db: PathBuf,
}
