//! HTTP surface: `GET /health`, `POST /initialize`, `POST /mcp` (spec §4.1/§6).
//! `/mcp` dispatches on `method` to one of the five recognized RPCs, verifying
//! `auth_token` for every method except registration itself.

use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use league_protocol::envelope::MessageEnvelope;
use league_protocol::error::{DomainErrorBody, DomainErrorCode, ProtocolError};
use league_protocol::ids::{parse_sender, Role};
use league_protocol::rpc::{JsonRpcRequest, JsonRpcResponse, RpcParams};

use crate::match_tracking::{MatchResult, ReportOutcome};
use crate::models::*;
use crate::round_coordinator;
use crate::state::AppState;
use crate::tournament_state::TournamentState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/initialize", post(initialize))
        .route("/mcp", post(mcp))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "agent_id": state.config.league_id,
        "role": "manager",
        "tools": ["register_player", "register_referee", "start_league", "report_match_result", "league_query"],
    }))
}

async fn initialize(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "league_id": state.config.league_id,
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
        "register_player" => {
            let params: RpcParams<RegisterPlayerRequest> = parse_params(request.params)?;
            let result = register_player(state, params).await?;
            Ok(serde_json::to_value(result)?)
        }
        "register_referee" => {
            let params: RpcParams<RegisterRefereeRequest> = parse_params(request.params)?;
            let result = register_referee(state, params).await?;
            Ok(serde_json::to_value(result)?)
        }
        "start_league" => {
            let params: RpcParams<StartLeagueRequest> = parse_params(request.params)?;
            authenticate(state, &params.envelope).await?;
            let total_rounds = round_coordinator::start_league(state)
                .await
                .map_err(|e| ProtocolError::Domain(DomainErrorBody::new(DomainErrorCode::Transient, e)))?;
            Ok(serde_json::to_value(StartLeagueResponse { accepted: true, total_rounds })?)
        }
        "report_match_result" => {
            let params: RpcParams<MatchResultReportRequest> = parse_params(request.params)?;
            authenticate(state, &params.envelope).await?;
            let result = report_match_result(state, params.body).await?;
            Ok(serde_json::to_value(result)?)
        }
        "league_query" => {
            let params: RpcParams<LeagueQueryRequest> = parse_params(request.params)?;
            authenticate(state, &params.envelope).await?;
            let result = league_query(state, params.body).await?;
            Ok(serde_json::to_value(result)?)
        }
        other => Err(ProtocolError::UnknownMethod(other.to_string())),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidParams(e.to_string()))
}

/// Every method but the two registration calls requires a valid `auth_token`
/// naming a sender the registry actually knows about, with one exception: the
/// Orchestrator is not a registered player or referee, so a sender of
/// `manager:admin` is authenticated against the shared `admin_token` instead.
async fn authenticate(state: &AppState, envelope: &MessageEnvelope) -> Result<(), ProtocolError> {
    let token = envelope.auth_token.as_deref().ok_or(ProtocolError::AuthMissing)?;
    let (role, id) = parse_sender(&envelope.sender).ok_or_else(|| ProtocolError::MalformedEnvelope("bad sender".into()))?;

    if role == Role::Manager && id == "admin" {
        return if !state.config.admin_token.is_empty() && constant_time_eq(&state.config.admin_token, token) {
            Ok(())
        } else {
            Err(ProtocolError::AuthInvalid)
        };
    }

    let data = state.data.lock().await;
    if data.registry.verify_token(role, id, token) {
        Ok(())
    } else {
        Err(ProtocolError::AuthInvalid)
    }
}

fn constant_time_eq(expected: &str, presented: &str) -> bool {
    use subtle::ConstantTimeEq;
    let a = expected.as_bytes();
    let b = presented.as_bytes();
    a.len() == b.len() && a.ct_eq(b).into()
}

async fn register_player(
    state: &AppState,
    params: RpcParams<RegisterPlayerRequest>,
) -> Result<RegisterResponse, ProtocolError> {
    let mut data = state.data.lock().await;
    match data.registry.register_player(params.body.display_name, params.body.endpoint, params.body.version) {
        Ok(agent) => Ok(RegisterResponse {
            status: RegistrationStatus::Registered,
            assigned_id: Some(agent.identity.id),
            auth_token: Some(agent.token),
            league_id: state.config.league_id.clone(),
        }),
        Err(_) => Ok(RegisterResponse {
            status: RegistrationStatus::Rejected,
            assigned_id: None,
            auth_token: None,
            league_id: state.config.league_id.clone(),
        }),
    }
}

async fn register_referee(
    state: &AppState,
    params: RpcParams<RegisterRefereeRequest>,
) -> Result<RegisterResponse, ProtocolError> {
    let mut data = state.data.lock().await;
    match data.registry.register_referee(
        params.body.display_name,
        params.body.endpoint,
        params.body.version,
        params.body.max_concurrent_matches,
    ) {
        Ok(agent) => Ok(RegisterResponse {
            status: RegistrationStatus::Registered,
            assigned_id: Some(agent.identity.id),
            auth_token: Some(agent.token),
            league_id: state.config.league_id.clone(),
        }),
        Err(_) => Ok(RegisterResponse {
            status: RegistrationStatus::Rejected,
            assigned_id: None,
            auth_token: None,
            league_id: state.config.league_id.clone(),
        }),
    }
}

/// Runs under the single `AppState` lock, giving the serialized
/// standings/outstanding-matches update the concurrency model calls for.
async fn report_match_result(
    state: &AppState,
    body: MatchResultReportRequest,
) -> Result<MatchResultReportResponse, ProtocolError> {
    let mut data = state.data.lock().await;
    let outcome = data.outstanding.record(MatchResult {
        match_id: body.match_id,
        player_a: body.player_a.clone(),
        player_b: body.player_b.clone(),
        winner: body.winner_player_id.clone(),
        drawn_number: body.drawn_number,
        reason: body.reason,
        status: body.status,
    });

    // An aborted match still updates standings: a technical win/loss (invitation
    // failure, choice timeout, invalid parity) is recorded identically to a
    // completed match (spec §4.2/§7), and a double-abort (no winner) still
    // counts as played via the `None` branch of `apply_result`.
    let duplicate = matches!(outcome, ReportOutcome::DuplicateIgnored);
    if !duplicate {
        let scoring = state.config.scoring.clone();
        data.standings.apply_result(&scoring, &body.player_a, &body.player_b, body.winner_player_id.as_deref());
    }

    Ok(MatchResultReportResponse { acknowledged: true, duplicate })
}

async fn league_query(state: &AppState, body: LeagueQueryRequest) -> Result<LeagueQueryResponse, ProtocolError> {
    let data = state.data.lock().await;
    let standings = matches!(body.query, LeagueQueryKind::Standings).then(|| {
        data.standings
            .ranked()
            .into_iter()
            .enumerate()
            .map(|(i, (player_id, standing))| StandingRow { player_id, rank: i + 1, standing })
            .collect()
    });
    let champion = if matches!(data.tournament_state, TournamentState::Completed) {
        data.standings.champion()
    } else {
        None
    };
    Ok(LeagueQueryResponse {
        tournament_state: format!("{:?}", data.tournament_state),
        current_round: data.current_round_id(),
        standings,
        champion,
    })
}
