//! calc-agent: pool of workers polling the orchestrator for tasks.
//!
//! Each worker fetches a task, waits for its dependencies through the
//! orchestrator, computes it and reports the result.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use calc_agent::{OrchestratorClient, WorkerPool};

// ── CLI ─────────────────────────────────────────────────────────────

/// Worker pool. Flags override the environment configuration.
#[derive(Parser, Debug)]
#[command(name = "calc-agent", version, about)]
struct Cli {
    /// Orchestrator base URL.
    #[arg(long, env = "ORCHESTRATOR_URL")]
    url: Option<String>,

    /// Number of concurrent workers.
    #[arg(long, short, env = "COMPUTING_POWER")]
    workers: Option<usize>,

    /// Poll interval in milliseconds.
    #[arg(long, env = "AGENT_POLL_INTERVAL_MS")]
    poll_ms: Option<u64>,

    /// Compute immediately instead of sleeping each task's operation time.
    #[arg(long, default_value_t = false)]
    no_simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    calc_core::config::load_dotenv();
    let cli = Cli::parse();
    let mut config = calc_core::Config::from_env();
    if let Some(url) = cli.url {
        config.agent.orchestrator_url = url;
    }
    if let Some(workers) = cli.workers {
        config.agent.computing_power = workers.max(1);
    }
    if let Some(poll_ms) = cli.poll_ms {
        config.agent.poll_interval_ms = poll_ms;
    }
    if cli.no_simulate {
        config.agent.simulate_duration = false;
    }
    config.log_summary();

    let client = OrchestratorClient::new(&config.agent.orchestrator_url)?;
    if let Err(e) = client.health_check().await {
        warn!(url = %config.agent.orchestrator_url, error = %e, "orchestrator not reachable yet, workers will keep polling");
    }

    let pool = WorkerPool::start(config.agent.computing_power, Arc::new(client), &config.agent);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    pool.shutdown().await;

    Ok(())
}
