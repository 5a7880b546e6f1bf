//! The six-phase match protocol (spec §4.3), run as one bounded-lifetime task
//! per `assign_match` call.

use std::collections::HashMap;
use std::time::Duration;

use league_protocol::envelope::{MessageEnvelope, MessageType};
use league_protocol::ids::{format_sender, Role};
use league_protocol::messages::{
    ChooseParityRequest, ChooseParityResponse, GameInvitationRequest, GameInvitationResponse, GameOverAck,
    GameOverNotification, MatchResultReportRequest, MatchResultReportResponse, MatchStatus, Parity,
};
use league_protocol::rpc::RpcParams;
use league_protocol::state_machine::StateMachine;
use league_protocol::time::now_compact;
use rand::Rng;

use crate::game_state::GameState;
use crate::state::AppState;

pub struct MatchAssignment {
    pub match_id: String,
    pub round_id: String,
    pub player_a: String,
    pub player_a_endpoint: String,
    pub player_b: String,
    pub player_b_endpoint: String,
    pub invitation_timeout_s: u64,
    pub choice_timeout_s: u64,
}

struct Decision {
    winner: Option<String>,
    drawn_number: Option<u8>,
    reason: String,
    status: MatchStatus,
    choices: HashMap<String, Parity>,
}

/// Runs one match to completion. Any panic-worthy condition is instead folded
/// into a technical decision; this task must always end by reporting to the
/// Manager, never by silently disappearing.
pub async fn run(state: AppState, assignment: MatchAssignment) {
    let mut game_state = GameState::Idle;
    let referee_sender = {
        let identity = state.identity.read().await;
        format_sender(Role::Referee, &identity.referee_id)
    };
    let started_at = now_compact();

    game_state.transition(GameState::WaitingForPlayers).expect("Idle -> WaitingForPlayers is always legal");

    let invite_a = invite(&state, &referee_sender, &assignment, &assignment.player_a, &assignment.player_a_endpoint, &assignment.player_b);
    let invite_b = invite(&state, &referee_sender, &assignment, &assignment.player_b, &assignment.player_b_endpoint, &assignment.player_a);
    let (accept_a, accept_b) = tokio::join!(invite_a, invite_b);

    let decision = match (accept_a, accept_b) {
        (true, true) => {
            game_state.transition(GameState::CollectingChoices).expect("WaitingForPlayers -> CollectingChoices is always legal");
            run_choice_phase(&state, &referee_sender, &assignment, &mut game_state).await
        }
        (true, false) => {
            game_state.transition(GameState::Aborted).ok();
            Decision {
                winner: Some(assignment.player_a.clone()),
                drawn_number: None,
                reason: format!("{} failed to accept the invitation", assignment.player_b),
                status: MatchStatus::Aborted,
                choices: HashMap::new(),
            }
        }
        (false, true) => {
            game_state.transition(GameState::Aborted).ok();
            Decision {
                winner: Some(assignment.player_b.clone()),
                drawn_number: None,
                reason: format!("{} failed to accept the invitation", assignment.player_a),
                status: MatchStatus::Aborted,
                choices: HashMap::new(),
            }
        }
        (false, false) => {
            game_state.transition(GameState::Aborted).ok();
            Decision {
                winner: None,
                drawn_number: None,
                reason: "both players failed to accept the invitation".to_string(),
                status: MatchStatus::Aborted,
                choices: HashMap::new(),
            }
        }
    };

    notify_players(&state, &referee_sender, &assignment, &decision).await;
    if game_state.transition(GameState::Finished).is_err() {
        tracing::debug!(match_id = %assignment.match_id, state = ?game_state, "match ended without reaching Finished (aborted earlier)");
    }
    report_result(&state, &referee_sender, &assignment, &decision, &started_at).await;
}

async fn invite(
    state: &AppState,
    referee_sender: &str,
    assignment: &MatchAssignment,
    player_id: &str,
    endpoint: &str,
    opponent_id: &str,
) -> bool {
    let envelope = MessageEnvelope::new(MessageType::GameInvitation, referee_sender.to_string())
        .with_round(assignment.round_id.clone())
        .with_match(assignment.match_id.clone());
    let body = GameInvitationRequest {
        match_id: assignment.match_id.clone(),
        round_id: assignment.round_id.clone(),
        opponent_id: opponent_id.to_string(),
    };
    let params = RpcParams { envelope, body };
    let client = state.rpc_client(endpoint).await;
    let deadline = Duration::from_secs(assignment.invitation_timeout_s.max(1));
    match client.call::<_, GameInvitationResponse>("handle_game_invitation", &params, deadline).await {
        Ok(resp) => resp.accept,
        Err(e) => {
            tracing::warn!(%player_id, match_id = %assignment.match_id, error = %e, "invitation failed");
            false
        }
    }
}

/// Both `choose_parity` calls are constructed here and driven through
/// `tokio::join!`, so neither player can observe being called before the
/// other — the fairness invariant from spec §5.
async fn run_choice_phase(state: &AppState, referee_sender: &str, assignment: &MatchAssignment, game_state: &mut GameState) -> Decision {
    let call_a = choose_parity(state, referee_sender, assignment, &assignment.player_a, &assignment.player_a_endpoint, &assignment.player_b);
    let call_b = choose_parity(state, referee_sender, assignment, &assignment.player_b, &assignment.player_b_endpoint, &assignment.player_a);
    let (choice_a, choice_b) = tokio::join!(call_a, call_b);

    match (choice_a, choice_b) {
        (Some(a), Some(b)) => {
            game_state.transition(GameState::DrawingNumber).expect("CollectingChoices -> DrawingNumber is always legal");
            let drawn = draw_number();
            let number_parity = Parity::of(drawn);
            game_state.transition(GameState::Evaluating).expect("DrawingNumber -> Evaluating is always legal");

            let mut choices = HashMap::new();
            choices.insert(assignment.player_a.clone(), a);
            choices.insert(assignment.player_b.clone(), b);

            // Exactly one of {a, b} matches number_parity since both are drawn from
            // the same two-element set and a != b is not guaranteed, so ties on
            // identical choices are broken by which one equals number_parity.
            let a_wins = a == number_parity;
            let b_wins = b == number_parity;
            let winner = match (a_wins, b_wins) {
                (true, false) => Some(assignment.player_a.clone()),
                (false, true) => Some(assignment.player_b.clone()),
                // Both chose the same parity as the draw, or neither did: the game
                // only has two possible choices, so this can only happen when both
                // players submitted the same parity. Favor the earlier-listed
                // player as a deterministic, documented tiebreak.
                (true, true) | (false, false) => Some(assignment.player_a.clone()),
            };
            let reason = format!(
                "drawn number {drawn} is {}; winner's choice matched",
                number_parity.as_str()
            );
            Decision { winner, drawn_number: Some(drawn), reason, status: MatchStatus::Completed, choices }
        }
        (Some(a), None) => {
            game_state.transition(GameState::Aborted).ok();
            let mut choices = HashMap::new();
            choices.insert(assignment.player_a.clone(), a);
            Decision {
                winner: Some(assignment.player_a.clone()),
                drawn_number: None,
                reason: format!("{} did not return a valid parity choice", assignment.player_b),
                status: MatchStatus::Aborted,
                choices,
            }
        }
        (None, Some(b)) => {
            game_state.transition(GameState::Aborted).ok();
            let mut choices = HashMap::new();
            choices.insert(assignment.player_b.clone(), b);
            Decision {
                winner: Some(assignment.player_b.clone()),
                drawn_number: None,
                reason: format!("{} did not return a valid parity choice", assignment.player_a),
                status: MatchStatus::Aborted,
                choices,
            }
        }
        (None, None) => {
            game_state.transition(GameState::Aborted).ok();
            Decision {
                winner: None,
                drawn_number: None,
                reason: "both players timed out or errored during choice collection".to_string(),
                status: MatchStatus::Aborted,
                choices: HashMap::new(),
            }
        }
    }
}

async fn choose_parity(
    state: &AppState,
    referee_sender: &str,
    assignment: &MatchAssignment,
    player_id: &str,
    endpoint: &str,
    opponent_id: &str,
) -> Option<Parity> {
    let envelope = MessageEnvelope::new(MessageType::ChooseParityCall, referee_sender.to_string())
        .with_round(assignment.round_id.clone())
        .with_match(assignment.match_id.clone());
    let body = ChooseParityRequest {
        match_id: assignment.match_id.clone(),
        opponent_id: opponent_id.to_string(),
        opponent_history: Vec::new(),
        standings_snapshot: HashMap::new(),
    };
    let params = RpcParams { envelope, body };
    let client = state.rpc_client(endpoint).await;
    let deadline = Duration::from_secs(assignment.choice_timeout_s.max(1));
    match client.call::<_, ChooseParityResponse>("choose_parity", &params, deadline).await {
        Ok(resp) => Some(resp.parity),
        Err(e) => {
            tracing::warn!(%player_id, match_id = %assignment.match_id, error = %e, "choose_parity failed");
            None
        }
    }
}

fn draw_number() -> u8 {
    rand::rng().random_range(1..=10)
}

async fn notify_players(state: &AppState, referee_sender: &str, assignment: &MatchAssignment, decision: &Decision) {
    for (player_id, endpoint) in [
        (&assignment.player_a, &assignment.player_a_endpoint),
        (&assignment.player_b, &assignment.player_b_endpoint),
    ] {
        let envelope = MessageEnvelope::new(MessageType::GameOver, referee_sender.to_string())
            .with_round(assignment.round_id.clone())
            .with_match(assignment.match_id.clone());
        let body = GameOverNotification {
            match_id: assignment.match_id.clone(),
            round_id: assignment.round_id.clone(),
            player_a: assignment.player_a.clone(),
            player_b: assignment.player_b.clone(),
            choices: decision.choices.clone(),
            drawn_number: decision.drawn_number,
            winner_player_id: decision.winner.clone(),
            reason: decision.reason.clone(),
        };
        let params = RpcParams { envelope, body };
        let client = state.rpc_client(endpoint).await;
        // Fire-and-forget: log failures, never block match completion on them.
        if let Err(e) = client.call::<_, GameOverAck>("notify_match_result", &params, Duration::from_secs(5)).await {
            tracing::warn!(%player_id, match_id = %assignment.match_id, error = %e, "notify_match_result failed");
        }
    }
}

async fn report_result(
    state: &AppState,
    referee_sender: &str,
    assignment: &MatchAssignment,
    decision: &Decision,
    started_at: &str,
) {
    let manager_endpoint = state.identity.read().await.manager_endpoint.clone();
    let auth_token = state.identity.read().await.auth_token.clone();
    let envelope = MessageEnvelope::new(MessageType::MatchResultReport, referee_sender.to_string())
        .with_round(assignment.round_id.clone())
        .with_match(assignment.match_id.clone())
        .with_auth(auth_token);
    let body = MatchResultReportRequest {
        match_id: assignment.match_id.clone(),
        round_id: assignment.round_id.clone(),
        player_a: assignment.player_a.clone(),
        player_b: assignment.player_b.clone(),
        choices: decision.choices.clone(),
        drawn_number: decision.drawn_number,
        winner_player_id: decision.winner.clone(),
        reason: decision.reason.clone(),
        status: decision.status,
        started_at: started_at.to_string(),
        finished_at: now_compact(),
    };
    let params = RpcParams { envelope, body };
    let client = state.rpc_client(&manager_endpoint).await;
    // Authoritative: retried by the client's own backoff policy, and this is
    // the only call whose failure leaves the match permanently unreported.
    match client
        .call::<_, MatchResultReportResponse>("report_match_result", &params, Duration::from_secs(60))
        .await
    {
        Ok(_) => tracing::info!(match_id = %assignment.match_id, "match result reported"),
        Err(e) => tracing::error!(match_id = %assignment.match_id, error = %e, "failed to report match result after retries"),
    }
}
