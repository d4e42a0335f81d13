//! Concord daemon: entry point for running a Concord node.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};

use concord_node::{parse_script, ConcordNode, NodeConfig};
use concord_nullables::{NullClock, NullLedger};
use concord_types::{NetworkId, Oracle};
use concord_utils::{init_logging, LogFormat, OutcomeStats};

#[derive(Parser)]
#[command(name = "concord", about = "Concord DAO core daemon")]
struct Cli {
    /// Network: "live", "test", or "dev".
    /// When a config file is provided, defaults to the file's network value.
    #[arg(long, env = "CONCORD_NETWORK")]
    network: Option<NetworkId>,

    /// Log level filter, e.g. "info" or "warn,concord_oracle=debug".
    #[arg(long, env = "CONCORD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CONCORD_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CONCORD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a JSON call script against a fresh node.
    Replay {
        /// Path to the script.
        script: PathBuf,

        /// Stop at the first failing call and exit non-zero.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Replay { script, strict } => replay(&config, &script, strict),
        Command::InitConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// File config (or network defaults) with CLI and env overrides on top.
fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::for_network(cli.network.unwrap_or(NetworkId::Dev)),
    };
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn replay(config: &NodeConfig, path: &Path, strict: bool) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading script {}", path.display()))?;
    let steps = parse_script(&json)?;

    let clock = NullClock::new(0);
    let ledger = NullLedger::with_balances(config.genesis_balances.clone());
    let mut node = ConcordNode::new(config, clock.clone(), ledger)?;
    tracing::info!(
        network = config.network.as_str(),
        steps = steps.len(),
        script = %path.display(),
        "replaying script"
    );

    let mut stats = OutcomeStats::new();
    let mut last_at = 0;
    for (index, step) in steps.iter().enumerate() {
        if step.at < last_at {
            bail!("step {index} runs at {} but time is already {last_at}", step.at);
        }
        last_at = step.at;
        clock.set(step.at);

        let line = match node.apply(&step.call) {
            Ok(outcome) => {
                stats.record_ok();
                serde_json::json!({ "step": index, "at": step.at, "ok": outcome })
            }
            Err(e) => {
                stats.record_err(e.kind());
                tracing::debug!(step = index, error = %e, "call failed");
                serde_json::json!({
                    "step": index,
                    "at": step.at,
                    "error": e.kind().as_str(),
                    "message": e.to_string(),
                })
            }
        };
        println!("{line}");
        if strict && stats.failed() > 0 {
            bail!("step {index} failed; stopping");
        }
    }

    tracing::info!(
        latest_seq = node.oracle().latest_seq(),
        treasury = %node.treasury_balance(),
        proposals = node.governance().proposals().count(),
        "replay finished"
    );
    eprintln!("{}", stats.summary());
    Ok(())
}
