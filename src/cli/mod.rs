//! CLI module - Command-line interface for the GLOM auth service
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// GLOM Auth - credential and device-bound login service
#[derive(Parser)]
#[command(name = "glom-auth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon", alias = "-d")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Validate the config and open the user store
    #[command(alias = "-c")]
    Check,
}

pub use commands::*;
