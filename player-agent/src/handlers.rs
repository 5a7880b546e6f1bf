//! Inbound HTTP surface: `handle_game_invitation`, `choose_parity`,
//! `notify_match_result` (spec §4.4), all with strict deadlines enforced by
//! the caller, not here.

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use league_protocol::error::ProtocolError;
use league_protocol::ids::Role;
use league_protocol::messages::{
    ChooseParityRequest, ChooseParityResponse, GameInvitationRequest, GameInvitationResponse, GameOverAck,
    GameOverNotification,
};
use league_protocol::rpc::{JsonRpcRequest, JsonRpcResponse, RpcParams};
use league_protocol::time::now_compact;

use crate::history::MatchRecord;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/initialize", post(initialize))
        .route("/mcp", post(mcp))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let identity = state.identity.read().await;
    Json(serde_json::json!({
        "status": "healthy",
        "agent_id": identity.player_id,
        "role": Role::Player.as_str(),
        "tools": ["handle_game_invitation", "choose_parity", "notify_match_result"],
    }))
}

async fn initialize(State(state): State<AppState>) -> Json<serde_json::Value> {
    let identity = state.identity.read().await;
    Json(serde_json::json!({
        "role": Role::Player.as_str(),
        "player_id": identity.player_id,
        "protocol": league_protocol::envelope::PROTOCOL_VERSION,
    }))
}

async fn mcp(State(state): State<AppState>, Json(request): Json<JsonRpcRequest>) -> Json<JsonRpcResponse> {
    let id = request.id;
    match dispatch(&state, request).await {
        Ok(result) => Json(JsonRpcResponse::success(id, result)),
        Err(err) => Json(JsonRpcResponse::failure(id, err.into_rpc_error())),
    }
}

async fn dispatch(state: &AppState, request: JsonRpcRequest) -> Result<serde_json::Value, ProtocolError> {
    match request.method.as_str() {
        "handle_game_invitation" => {
            let params: RpcParams<GameInvitationRequest> = parse(request.params)?;
            Ok(serde_json::to_value(handle_game_invitation(params.body))?)
        }
        "choose_parity" => {
            let params: RpcParams<ChooseParityRequest> = parse(request.params)?;
            let response = choose_parity(state, params.body).await;
            Ok(serde_json::to_value(response)?)
        }
        "notify_match_result" => {
            let params: RpcParams<GameOverNotification> = parse(request.params)?;
            let response = notify_match_result(state, params.body).await;
            Ok(serde_json::to_value(response)?)
        }
        other => Err(ProtocolError::UnknownMethod(other.to_string())),
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidParams(e.to_string()))
}

/// Declining is not a supported strategy: this call exists only to
/// synchronize both players before the choice phase begins.
fn handle_game_invitation(_body: GameInvitationRequest) -> GameInvitationResponse {
    GameInvitationResponse { accept: true, arrival_timestamp: now_compact() }
}

/// Never returns an error: the strategy interface itself always yields a
/// valid parity, so there is nothing here to clamp or fall back on.
async fn choose_parity(state: &AppState, body: ChooseParityRequest) -> ChooseParityResponse {
    let history = state.history.read().await;
    let opponent_history = history.opponent_history(&body.opponent_id).to_vec();
    drop(history);

    let parity = state.strategy.choose(&body.opponent_id, &opponent_history, &body.standings_snapshot);
    ChooseParityResponse { parity }
}

async fn notify_match_result(state: &AppState, body: GameOverNotification) -> GameOverAck {
    let player_id = state.identity.read().await.player_id.clone();
    let opponent_id = if body.player_a == player_id { body.player_b.clone() } else { body.player_a.clone() };
    let own_choice = body.choices.get(&player_id).copied();
    let opponent_choice = body.choices.get(&opponent_id).copied();
    let won = body.winner_player_id.as_deref() == Some(player_id.as_str());

    let record = MatchRecord {
        match_id: body.match_id,
        round_id: body.round_id,
        opponent_id,
        own_choice,
        drawn_number: body.drawn_number,
        won,
    };

    let mut history = state.history.write().await;
    history.record(record, opponent_choice);
    let paths = state.history_paths().await;
    if let Err(e) = crate::history::save(&paths, &player_id, &history).await {
        tracing::error!(error = %e, "failed to persist match history");
    }

    GameOverAck { acknowledged: true }
}
