//! weather-mcp: MCP server for current weather, forecasts and city search
//!
//! This tool gives AI assistants access to an upstream weather service
//! through the Model Context Protocol over stdio.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use weather_mcp::config;
use weather_mcp::mcp::{Dispatcher, McpServer, Registry};
use weather_mcp::provider::OpenWeatherProvider;

/// MCP server for current weather, forecasts and city search.
///
/// Reads JSON-RPC requests on stdin and writes responses on stdout. Logs go
/// to stderr. The provider API key is read from the environment.
#[derive(Parser, Debug)]
#[command(name = "weather-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the weather-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // A missing .env file is fine; the key may come from the real environment
    let _ = dotenv::dotenv();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if let Some(source) = std::error::Error::source(&e) {
                eprintln!("  caused by: {source}");
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "weather-mcp {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting weather-mcp server"
    );

    let api_key = match config::api_key_from_env(&cfg.provider) {
        Ok(key) => key,
        Err(e) => {
            error!(error = %e, "Missing provider credential");
            eprintln!("Set {} in the environment or in a .env file", cfg.provider.api_key_env);
            return ExitCode::FAILURE;
        }
    };

    let provider = match OpenWeatherProvider::new(api_key, &cfg.provider) {
        Ok(provider) => provider,
        Err(e) => {
            error!(error = %e, "Failed to create weather provider");
            return ExitCode::FAILURE;
        }
    };

    info!(
        base_url = %cfg.provider.base_url,
        timeout_secs = cfg.provider.timeout_secs,
        air_quality = cfg.provider.air_quality,
        "Weather provider configured"
    );

    let dispatcher = Dispatcher::new(Arc::new(Registry::new()), Arc::new(provider));
    let server = McpServer::new(dispatcher, cfg.server.max_frame_bytes);

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
