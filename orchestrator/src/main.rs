mod agent_health;
mod communication_verifier;
mod config;
mod dashboard;
mod error_recovery;
mod health_monitor;
mod lifecycle;
mod log_aggregator;
mod state;
mod tournament_controller;

use clap::Parser;
use league_protocol::config::{CommonArgs, LeagueConfig};

use crate::config::OrchestratorConfig;
use crate::state::AppState;

#[derive(Debug, Parser)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    league_protocol::logging::init_tracing("orchestrator=info,tower_http=info");

    let args = Args::parse();
    let orchestrator_config = OrchestratorConfig::load(args.common.config.as_deref())?;
    let league_config = LeagueConfig::load(args.common.config.as_deref())?;

    let manager_endpoint = manager_endpoint(&orchestrator_config)?;

    let state = AppState::new(orchestrator_config);

    lifecycle::start_all(&state).await?;
    communication_verifier::verify_all(&state).await?;

    tokio::spawn(health_monitor::run(state.clone()));
    tokio::spawn(error_recovery::run(state.clone()));
    tokio::spawn(tournament_controller::run(state.clone(), league_config, manager_endpoint));

    let app = dashboard::router(state.clone());
    let addr = format!("0.0.0.0:{}", args.common.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "orchestrator dashboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn manager_endpoint(config: &OrchestratorConfig) -> anyhow::Result<String> {
    let spec = config
        .agents
        .iter()
        .find(|spec| spec.role == "manager")
        .ok_or_else(|| anyhow::anyhow!("no agent with role \"manager\" in orchestrator config"))?;
    Ok(spec.health_url.trim_end_matches("/health").to_string())
}
