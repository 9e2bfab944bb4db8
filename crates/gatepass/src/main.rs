//! `gatepass` - CLI for the gatepass registration service
//!
//! This binary runs the web service and provides maintenance commands for
//! the registration store.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use gatepass::cli::{Cli, Command, ConfigCommand, QrCommand, ServeCommand};
use gatepass::{init_logging, AppState, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config_path = cli.config;
    let load = || Config::load_from(config_path.clone());

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(load()?, serve_cmd),
        Command::Status(status_cmd) => handle_status(&load()?, status_cmd.json),
        Command::Qr(qr_cmd) => handle_qr(&load()?, qr_cmd),
        Command::Config(ConfigCommand::Show { json }) => handle_config_show(&load()?, json),
        Command::Config(ConfigCommand::Path) => {
            println!("{}", Config::default_config_path().display());
            Ok(())
        }
        // Checks its own file, so a broken default config must not abort it.
        Command::Config(ConfigCommand::Validate { file }) => {
            handle_validate(file.or_else(|| config_path.clone()))
        }
    }
}

fn handle_validate(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    Config::load_from(Some(path.clone()))
        .with_context(|| format!("configuration at {} is invalid", path.display()))?;
    println!("Configuration is valid.");
    Ok(())
}

fn handle_serve(mut config: Config, cmd: ServeCommand) -> anyhow::Result<()> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    config.validate()?;

    let addr = config.bind_addr()?;
    let state = AppState::from_config(&config)?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(gatepass::http::serve(state, addr))?;
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = config.open_storage()?;
    let registrations = storage.count()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "qr_directory": config.qr.directory,
            "registrations": registrations,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("gatepass status");
        println!("---------------");
        println!("Database:       {}", storage.path().display());
        println!("QR directory:   {}", config.qr.directory.display());
        println!("Registrations:  {registrations}");
    }
    Ok(())
}

fn handle_qr(config: &Config, cmd: QrCommand) -> anyhow::Result<()> {
    match cmd {
        QrCommand::Regenerate { id, base_url } => {
            let state = AppState::from_config(config)?;
            let origin = base_url.unwrap_or_else(|| config.fallback_origin());

            match state.registrar().regenerate_qr(id, &origin)? {
                Some(path) => println!("Wrote {}", path.display()),
                None => anyhow::bail!("no registration with id {id}"),
            }
        }
    }
    Ok(())
}

fn handle_config_show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Server]");
    println!("  Bind address:   {}:{}", config.server.host, config.server.port);
    println!(
        "  Public URL:     {}",
        config.public_origin().unwrap_or("(from request)")
    );
    println!();
    println!("[Storage]");
    println!("  Database path:  {}", config.storage.database_path.display());
    println!("  Busy timeout:   {} ms", config.storage.busy_timeout_ms);
    println!();
    println!("[QR]");
    println!("  Directory:      {}", config.qr.directory.display());
    println!("  URL prefix:     {}", config.qr_url_prefix());
    println!("  Module size:    {} px", config.qr.module_size);
    Ok(())
}
