mod handlers;
mod history;
mod state;
mod strategy;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use league_protocol::config::{CommonArgs, LeagueConfig};
use league_protocol::envelope::{MessageEnvelope, MessageType};
use league_protocol::ids::{format_sender, Role};
use league_protocol::messages::{RegisterPlayerRequest, RegisterResponse, RegistrationStatus};
use league_protocol::rpc::{CircuitRegistry, RpcClient, RpcParams};

#[derive(Debug, Parser)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Base URL of the League Manager this player registers against.
    #[arg(long)]
    manager_endpoint: String,
    #[arg(long, default_value = "player")]
    display_name: String,
    /// "random" or "adaptive".
    #[arg(long, default_value = "random")]
    strategy: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    league_protocol::logging::init_tracing("player_agent=info,tower_http=info");

    let args = Args::parse();
    let config = LeagueConfig::load(args.common.config.as_deref())?;
    let strategy: Arc<dyn strategy::Strategy> = Arc::from(strategy::build(&args.strategy, config.adaptive.clone()));

    let app_state = state::AppState::new(config.clone(), args.common.data_dir.clone(), strategy);
    let self_endpoint = format!("http://127.0.0.1:{}", args.common.port);

    let registered = register_with_manager(&args, &config, &self_endpoint).await?;
    {
        let mut identity = app_state.identity.write().await;
        identity.player_id = registered.assigned_id.clone().unwrap_or_default();
        identity.auth_token = registered.auth_token.clone().unwrap_or_default();
    }
    {
        let player_id = app_state.identity.read().await.player_id.clone();
        let paths = app_state.history_paths().await;
        *app_state.history.write().await = history::load(&paths).await;
        tracing::info!(%player_id, "registered with manager");
    }

    let app = handlers::router(app_state);
    let addr = format!("0.0.0.0:{}", args.common.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "player-agent listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn register_with_manager(args: &Args, config: &LeagueConfig, self_endpoint: &str) -> anyhow::Result<RegisterResponse> {
    let circuits = CircuitRegistry::new(config.circuit.clone());
    let breaker = circuits.breaker_for(&args.manager_endpoint).await;
    let client = RpcClient::new(args.manager_endpoint.clone(), config.report_retry.clone(), breaker);

    let envelope = MessageEnvelope::new(MessageType::LeagueRegisterRequest, format_sender(Role::Player, "unregistered"));
    let body = RegisterPlayerRequest {
        display_name: args.display_name.clone(),
        endpoint: self_endpoint.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let params = RpcParams { envelope, body };

    let response: RegisterResponse = client
        .call("register_player", &params, Duration::from_secs(config.agent_startup_timeout_s))
        .await
        .map_err(|e| anyhow::anyhow!("failed to register with manager: {e}"))?;

    if response.status != RegistrationStatus::Registered {
        anyhow::bail!("manager rejected player registration: capacity reached");
    }
    Ok(response)
}
