//! calc-server: HTTP orchestrator for distributed expression evaluation.
//!
//! Accepts expressions on `/api/v1/calculate`, schedules them as dependency
//! linked tasks and hands those out to polling workers on `/internal/task`.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use calc_server::background::spawn_watchdog;
use calc_server::{build_router, AppState};

// ── CLI ─────────────────────────────────────────────────────────────

/// Orchestrator server. Flags override the environment configuration.
#[derive(Parser, Debug)]
#[command(name = "calc-server", version, about)]
struct Cli {
    /// Bind address.
    #[arg(long)]
    host: Option<String>,

    /// Listen port.
    #[arg(long, short)]
    port: Option<u16>,

    /// Disable the stale-task watchdog.
    #[arg(long, default_value_t = false)]
    no_watchdog: bool,
}

fn load_config() -> calc_core::Config {
    calc_core::config::load_dotenv();
    calc_core::Config::from_env()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.log_summary();

    let state = Arc::new(AppState::new(config.clone()));
    if !cli.no_watchdog {
        spawn_watchdog(state.orchestrator.clone(), &config.watchdog);
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
