//! Inbound HTTP surface: `GET /health`, `POST /initialize`, `POST /mcp` with
//! the single recognized method `assign_match`.

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use league_protocol::error::ProtocolError;
use league_protocol::ids::Role;
use league_protocol::messages::{AssignMatchRequest, AssignMatchResponse};
use league_protocol::rpc::{JsonRpcRequest, JsonRpcResponse, RpcParams};

use crate::match_runner::{self, MatchAssignment};
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
        "agent_id": identity.referee_id,
        "role": Role::Referee.as_str(),
        "tools": ["assign_match"],
    }))
}

async fn initialize(State(state): State<AppState>) -> Json<serde_json::Value> {
    let identity = state.identity.read().await;
    Json(serde_json::json!({
        "role": Role::Referee.as_str(),
        "referee_id": identity.referee_id,
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
        "assign_match" => {
            let params: RpcParams<AssignMatchRequest> = serde_json::from_value(request.params)
                .map_err(|e| ProtocolError::InvalidParams(e.to_string()))?;
            let body = params.body;
            let assignment = MatchAssignment {
                match_id: body.match_id,
                round_id: body.round_id,
                player_a: body.player_a,
                player_a_endpoint: body.player_a_endpoint,
                player_b: body.player_b,
                player_b_endpoint: body.player_b_endpoint,
                invitation_timeout_s: body.invitation_timeout_s,
                choice_timeout_s: body.choice_timeout_s,
            };
            // Acknowledge immediately; the match itself runs to completion
            // asynchronously and reports back to the Manager on its own.
            tokio::spawn(match_runner::run(state.clone(), assignment));
            Ok(serde_json::to_value(AssignMatchResponse { accepted: true })?)
        }
        other => Err(ProtocolError::UnknownMethod(other.to_string())),
    }
}
