//! CLI module for teamshare
//!
//! Provides subcommands:
//! - `serve`: HTTP API server
//! - `reconcile`: full ACL resynchronisation for one or all teams
//! - `token`: mint a development caller token

pub mod reconcile;
pub mod serve;
pub mod token;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Teamshare - keeps shared file and folder ACLs in line with team membership
#[derive(Parser)]
#[command(name = "teamshare")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Rebuild resource ACLs from stored membership
    Reconcile(reconcile::ReconcileArgs),

    /// Mint a caller token for local development
    Token(token::TokenArgs),
}

/// Loads `.env`, configuration files and environment overrides, then installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    Ok(config)
}
