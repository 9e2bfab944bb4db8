//! Command-line interface for gatepass.
//!
//! This module provides the CLI structure for the `gatepass` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, QrCommand, ServeCommand, StatusCommand};

use crate::logging::Verbosity;

/// gatepass - Visitor registration with QR-linked profiles
///
/// Serves the gatepass registration form, stores registrants in `SQLite` and
/// issues a QR code linking to each registrant's public profile.
#[derive(Debug, Parser)]
#[command(name = "gatepass")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the registration web service
    Serve(ServeCommand),

    /// Show storage status
    Status(StatusCommand),

    /// Manage QR artifacts
    #[command(subcommand)]
    Qr(QrCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }
}
