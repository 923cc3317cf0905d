// # ddns - one-shot DDNS updater
//
// This binary is a THIN integration layer:
// - DO NOT add DNS logic or retry logic here
// - All reconciliation logic lives in ddns-core
//
// It is responsible for:
// 1. Parsing the command line
// 2. Initializing logging
// 3. Loading the configuration file
// 4. Registering providers and building the configured one
// 5. Running the Reconciler once and mapping the result to an exit code
//
// The program is meant to be invoked periodically by an external scheduler
// (cron, systemd timer). A failed run is retried by the next invocation.
//
// ## Example
//
// ```bash
// ddns --config /etc/ddns/config.json
// DDNS_LOG_LEVEL=debug ddns --dry-run
// ```

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::{DdnsConfig, ErrorKind, Outcome, ProviderRegistry, Reconciler};
use ddns_ip_http::HttpIpSource;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible run results
///
/// - 0: UpToDate, Updated or DryRun
/// - 1: Configuration error (no network call was made)
/// - 2: Run failed (network, not found, provider error)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Reconciliation failed
    RunFailed = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl From<&ddns_core::Error> for DdnsExitCode {
    fn from(err: &ddns_core::Error) -> Self {
        match err.kind() {
            ErrorKind::Config => DdnsExitCode::ConfigError,
            _ => DdnsExitCode::RunFailed,
        }
    }
}

/// Update one DNS A record to this host's public IPv4 address
#[derive(Debug, Parser)]
#[command(name = "ddns", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "DDNS_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Perform every lookup but do not update the record
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "Log level '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Build a registry holding every compiled-in provider
fn build_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    ddns_provider_cloudflare::register(&registry);

    #[cfg(feature = "aliyun")]
    ddns_provider_aliyun::register(&registry);

    #[cfg(feature = "dnspod")]
    ddns_provider_dnspod::register(&registry);

    registry
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match parse_log_level(&cli.log_level) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(log_level) {
        eprintln!("{:#}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = match DdnsConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::from(&e).into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::RunFailed.into();
        }
    };

    let code = rt.block_on(async {
        match run(config, cli.dry_run).await {
            Ok(outcome) => {
                report(&outcome);
                DdnsExitCode::Success
            }
            Err(e) => {
                error!("Run failed: {}", e);
                DdnsExitCode::from(&e)
            }
        }
    });

    code.into()
}

/// Build the components and run one reconciliation
async fn run(config: DdnsConfig, dry_run: bool) -> ddns_core::Result<Outcome> {
    let registry = build_registry();
    let timeout = config.http_timeout();

    let provider = registry.create_provider(&config.provider, timeout)?;
    let ip_source = HttpIpSource::from_config(&config.ip_source, timeout)?;

    let (reconciler, _events) =
        Reconciler::new(Box::new(ip_source), provider, config.target());
    let reconciler = reconciler.with_dry_run(dry_run);

    reconciler.run().await
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::UpToDate { value } => {
            info!("Done: record is up to date ({})", value);
        }
        Outcome::Updated {
            previous,
            current,
            duplicate,
        } => {
            info!(
                "Done: record updated {} -> {}{}",
                previous,
                current,
                if *duplicate { " (already stored)" } else { "" }
            );
        }
        Outcome::DryRun { previous, desired } => {
            info!("Done [DRY-RUN]: record would be updated {} -> {}", previous, desired);
        }
    }
}
