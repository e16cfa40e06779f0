//! CLI module for the API key registry
//!
//! - `serve`: run the HTTP API
//! - `mint`: print a freshly minted key
//! - `migrate`: apply or inspect PostgreSQL migrations

pub mod migrate;
pub mod mint;
pub mod serve;

use clap::{Parser, Subcommand};

/// API key registry - mint, store and validate opaque bearer keys
#[derive(Parser)]
#[command(name = "apikey-registry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Print a new key without storing it
    Mint(mint::MintArgs),

    /// Apply pending PostgreSQL migrations
    Migrate(migrate::MigrateArgs),
}
