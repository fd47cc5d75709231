use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratecheck::config::{LogFormat, RatecheckConfig};
use ratecheck::ratelimit::{PolicySet, TracingObserver};
use ratecheck::snapshot::{evaluate, Snapshot};
use ratecheck::watch::{shutdown_signal, Watcher};

/// Evaluate rate limit rules against aggregated counter snapshots.
#[derive(Debug, Parser)]
#[command(name = "ratecheck", version, about)]
struct Cli {
    /// Application config file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rate limit policy file (YAML); overrides `policy.path`
    #[arg(short, long, global = true)]
    policy: Option<PathBuf>,

    /// Log filter directive; overrides `logging.level`
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format; overrides `logging.format`
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a snapshot once and print the decision as JSON
    Check {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
    },
    /// Re-evaluate a snapshot on an interval until interrupted
    Watch {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
        /// Seconds between evaluations; overrides `watch.interval_secs`
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Print the effective policy as YAML
    Policy,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = RatecheckConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    init_tracing(&config)?;
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let policy_path = cli.policy.or_else(|| config.policy.path.as_ref().map(PathBuf::from));
    let policy = match &policy_path {
        Some(path) => PolicySet::from_file(path)
            .with_context(|| format!("loading policy from {}", path.display()))?,
        None => PolicySet::default(),
    };
    info!(
        source_rules = policy.source_limits.len(),
        request_rules = policy.request_limits.len(),
        "Policy loaded"
    );

    match cli.command {
        Command::Check { snapshot } => {
            let input = Snapshot::from_file(&snapshot)
                .with_context(|| format!("loading snapshot from {}", snapshot.display()))?;
            let decision = evaluate(&input, &policy, &TracingObserver);
            println!("{}", serde_json::to_string_pretty(&decision)?);

            Ok(ExitCode::from(decision.exit_status()))
        }
        Command::Watch { snapshot, interval } => {
            let secs = interval.unwrap_or(config.watch.interval_secs);
            anyhow::ensure!(secs > 0, "interval must be greater than 0");

            let watcher = Watcher::new(snapshot, policy, Duration::from_secs(secs), TracingObserver);
            watcher.run_until(shutdown_signal()).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Policy => {
            print!("{}", policy.to_yaml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Initialize tracing; `RUST_LOG` takes precedence over the configured level.
fn init_tracing(config: &RatecheckConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}
