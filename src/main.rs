//! Breaker demo.
//!
//! Fires a burst of commands with jittered work durations at one configured
//! breaker, then reports how they were admitted and how the circuit recovers.
//!
//! ```text
//!  burst of N commands ──▶ Breaker ──▶ Success / Timeout / Rejected
//!                             │
//!                             └── recovery prober ──▶ Degraded → Healthy
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use futures_util::future::join_all;
use rand::Rng;
use serde_json::json;

use command_breaker::config::loader::load_config;
use command_breaker::config::AppConfig;
use command_breaker::observability::{logging, TracingSink};
use command_breaker::{BreakerRegistry, Command, CommandError};

#[derive(Parser)]
#[command(name = "breaker-demo")]
#[command(about = "Exercise a circuit breaker with a burst of simulated commands", long_about = None)]
struct Cli {
    /// TOML configuration file (built-in defaults when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Breaker to exercise (first configured breaker when omitted).
    #[arg(short, long)]
    breaker: Option<String>,

    /// Number of commands in the burst.
    #[arg(short = 'n', long, default_value_t = 20)]
    commands: usize,

    /// Base work duration of each command in milliseconds.
    #[arg(long, default_value_t = 200)]
    work_ms: u64,

    /// Random extra work added to each command, up to this many milliseconds.
    #[arg(long, default_value_t = 1000)]
    jitter_ms: u64,

    /// Make every n-th command fail (0 disables).
    #[arg(long, default_value_t = 0)]
    fail_every: usize,
}

/// Simulated call to a downstream dependency.
struct SimulatedCall {
    name: String,
    work: Duration,
    fail: bool,
}

#[async_trait]
impl Command for SimulatedCall {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), CommandError> {
        tokio::time::sleep(self.work).await;
        if self.fail {
            return Err(CommandError::new("downstream returned an error"));
        }
        tracing::debug!(command = %self.name, work_ms = self.work.as_millis() as u64, "Work finished");
        Ok(())
    }

    fn fallback(&self) -> Result<(), CommandError> {
        tracing::debug!(command = %self.name, "Serving cached default");
        Ok(())
    }

    fn cleanup(&self) -> Result<(), CommandError> {
        tracing::debug!(command = %self.name, "Releasing request resources");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    logging::init(&config.observability)?;

    tracing::info!(breakers = config.breakers.len(), "Configuration loaded");

    let registry = BreakerRegistry::from_config(&config.breakers, Arc::new(TracingSink));
    let name = match cli.breaker.clone().or_else(|| config.breakers.first().map(|b| b.name.clone())) {
        Some(name) => name,
        None => return Err("no breaker configured".into()),
    };
    let breaker = registry
        .get(&name)
        .ok_or_else(|| format!("unknown breaker '{}'", name))?;

    let handles: Vec<_> = {
        let mut rng = rand::thread_rng();
        (0..cli.commands)
            .map(|i| {
                let jitter = if cli.jitter_ms > 0 { rng.gen_range(0..=cli.jitter_ms) } else { 0 };
                breaker.execute(SimulatedCall {
                    name: format!("call-{}", i),
                    work: Duration::from_millis(cli.work_ms + jitter),
                    fail: cli.fail_every > 0 && (i + 1) % cli.fail_every == 0,
                })
            })
            .collect()
    };

    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for report in join_all(handles).await {
        let key = match report {
            Ok(outcome) => outcome.kind().as_str().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Command reported an error");
                "error".to_string()
            }
        };
        *tally.entry(key).or_default() += 1;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "outcomes": tally, "breaker": breaker.snapshot() }))?
    );

    // Give the prober a chance to observe freed capacity.
    let settle = breaker.probe_interval() * 2 + Duration::from_millis(cli.work_ms + cli.jitter_ms);
    tokio::time::sleep(settle).await;
    println!("{}", serde_json::to_string_pretty(&registry.snapshots())?);

    registry.shutdown_all();
    tracing::info!("Shutdown complete");
    Ok(())
}
