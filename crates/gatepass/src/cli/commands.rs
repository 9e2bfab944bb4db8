//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Interface to bind (overrides `server.host`)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `server.port`)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// QR artifact commands.
#[derive(Debug, Subcommand)]
pub enum QrCommand {
    /// Rebuild the QR image of an existing registration
    Regenerate {
        /// Internal identifier of the registration
        id: i64,

        /// Origin encoded in the profile URL (defaults to the configured public URL)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
