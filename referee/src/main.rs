mod game_state;
mod handlers;
mod match_runner;
mod state;

use std::time::Duration;

use clap::Parser;
use league_protocol::config::{CommonArgs, LeagueConfig};
use league_protocol::envelope::{MessageEnvelope, MessageType};
use league_protocol::ids::{format_sender, Role};
use league_protocol::messages::{RegisterRefereeRequest, RegisterResponse, RegistrationStatus};
use league_protocol::rpc::{CircuitRegistry, RpcClient, RpcParams};

#[derive(Debug, Parser)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Base URL of the League Manager this referee registers against.
    #[arg(long)]
    manager_endpoint: String,
    #[arg(long, default_value = "referee")]
    display_name: String,
    #[arg(long)]
    max_concurrent_matches: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    league_protocol::logging::init_tracing("referee=info,tower_http=info");

    let args = Args::parse();
    let config = LeagueConfig::load(args.common.config.as_deref())?;

    let app_state = state::AppState::new(config.clone(), args.manager_endpoint.clone());
    let self_endpoint = format!("http://127.0.0.1:{}", args.common.port);

    let registered = register_with_manager(&args, &config, &self_endpoint).await?;
    {
        let mut identity = app_state.identity.write().await;
        identity.referee_id = registered.assigned_id.clone().unwrap_or_default();
        identity.auth_token = registered.auth_token.clone().unwrap_or_default();
    }
    tracing::info!(referee_id = %registered.assigned_id.unwrap_or_default(), "registered with manager");

    let app = handlers::router(app_state);
    let addr = format!("0.0.0.0:{}", args.common.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "referee listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn register_with_manager(args: &Args, config: &LeagueConfig, self_endpoint: &str) -> anyhow::Result<RegisterResponse> {
    let circuits = CircuitRegistry::new(config.circuit.clone());
    let breaker = circuits.breaker_for(&args.manager_endpoint).await;
    let client = RpcClient::new(args.manager_endpoint.clone(), config.report_retry.clone(), breaker);

    let envelope = MessageEnvelope::new(MessageType::RefereeRegisterRequest, format_sender(Role::Referee, "unregistered"));
    let body = RegisterRefereeRequest {
        display_name: args.display_name.clone(),
        endpoint: self_endpoint.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        max_concurrent_matches: args.max_concurrent_matches,
    };
    let params = RpcParams { envelope, body };

    let response: RegisterResponse = client
        .call("register_referee", &params, Duration::from_secs(config.agent_startup_timeout_s))
        .await
        .map_err(|e| anyhow::anyhow!("failed to register with manager: {e}"))?;

    if response.status != RegistrationStatus::Registered {
        anyhow::bail!("manager rejected referee registration: capacity reached");
    }
    Ok(response)
}
