// # udnsd - UltraDNS provider runner
//
// Thin integration layer over `udns-core`: it reads configuration from the
// environment, builds the HTTP client and the reconciler, and runs a single
// command. No DNS logic lives here.
//
// ## Commands
//
// - `udnsd records`: print the current endpoints of every allowed zone as JSON
// - `udnsd apply <changes.json>`: apply a `Changes` document and print the report
//
// ## Configuration
//
// - `ULTRADNS_USERNAME`, `ULTRADNS_PASSWORD`: API credentials (required)
// - `ULTRADNS_BASEURL`: REST API root, e.g. `https://api.ultradns.com` (required)
// - `ULTRADNS_ACCOUNTNAME`: account whose zones are managed (required)
// - `ULTRADNS_DOMAIN_FILTER`: comma-separated domain allow-list
// - `ULTRADNS_DRY_RUN`: `true` or `1` to log mutations instead of sending them
// - `UDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// ## Example
//
// ```bash
// export ULTRADNS_USERNAME=teamrest
// export ULTRADNS_PASSWORD=...
// export ULTRADNS_BASEURL=https://api.ultradns.com
// export ULTRADNS_ACCOUNTNAME=teamrest
//
// udnsd apply changes.json
// ```

use anyhow::{Context as _, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use udns_client_http::UltraDnsHttpClient;
use udns_core::{Changes, ChangeReconciler, Context, UltraDnsConfig};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Command completed
/// - 1: Usage, configuration or startup error
/// - 2: The command failed at runtime
#[derive(Debug, Clone, Copy)]
enum UdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<UdnsExitCode> for ExitCode {
    fn from(code: UdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What the runner was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Records,
    Apply(PathBuf),
}

impl Command {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut args = args.into_iter();
        match (args.next().as_deref(), args.next(), args.next()) {
            (Some("records"), None, None) => Ok(Command::Records),
            (Some("apply"), Some(path), None) => Ok(Command::Apply(PathBuf::from(path))),
            _ => anyhow::bail!("usage: udnsd records | udnsd apply <changes.json>"),
        }
    }
}

fn parse_log_level(value: &str) -> Result<Level> {
    match value.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "UDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}

fn main() -> ExitCode {
    let command = match Command::parse(env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return UdnsExitCode::ConfigError.into();
        }
    };

    // Load and validate configuration from environment
    let config = match UltraDnsConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return UdnsExitCode::ConfigError.into();
        }
    };

    let log_level =
        match parse_log_level(&env::var("UDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())) {
            Ok(level) => level,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return UdnsExitCode::ConfigError.into();
            }
        };

    // Logs go to stderr, stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return UdnsExitCode::ConfigError.into();
    }

    info!(account = %config.account_name, dry_run = config.dry_run, "Starting udnsd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return UdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(command, config).await {
            Ok(()) => UdnsExitCode::Success,
            Err(e) => {
                error!("udnsd failed: {:#}", e);
                UdnsExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the reconciler and run one command
async fn run(command: Command, config: UltraDnsConfig) -> Result<()> {
    let client = UltraDnsHttpClient::new(&config)?;
    let reconciler = ChangeReconciler::new(Box::new(client), &config)?;

    let ctx = Context::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received {}, cancelling", signal);
                canceller.cancel();
            }
            Err(e) => error!("Signal handling error: {}", e),
        }
    });

    match command {
        Command::Records => {
            let endpoints = reconciler.records(&ctx).await?;
            println!("{}", serde_json::to_string_pretty(&endpoints)?);
        }
        Command::Apply(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let changes: Changes = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a valid changes document", path.display()))?;

            let report = reconciler.apply_changes(&ctx, &changes).await?;
            println!(
                "{}",
                serde_json::json!({
                    "created": report.created,
                    "updated": report.updated,
                    "deleted": report.deleted,
                    "skipped": report.skipped,
                    "zonesFetched": report.zones_fetched,
                    "dryRun": report.dry_run,
                    "startedAt": report.started_at.to_rfc3339(),
                    "finishedAt": report.finished_at.to_rfc3339(),
                })
            );
        }
    }

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
