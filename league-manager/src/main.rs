mod handlers;
mod match_tracking;
mod models;
mod registry;
mod round_coordinator;
mod scheduler;
mod standings;
mod state;
mod tournament_state;

use clap::Parser;
use league_protocol::config::{CommonArgs, LeagueConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    league_protocol::logging::init_tracing("league_manager=info,tower_http=info");

    let args = CommonArgs::parse();
    let mut config = LeagueConfig::load(args.config.as_deref())?;
    if config.league_id == "default-league" {
        config.league_id = format!("league-{}", uuid::Uuid::new_v4());
    }

    let state = state::AppState::new(config);
    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "league-manager listening");
    axum::serve(listener, app).await?;
    Ok(())
}
