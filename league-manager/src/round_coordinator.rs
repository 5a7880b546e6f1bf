//! Drives the tournament from `Scheduling` through each round to `Completed`
//! (spec §4.2, §3). Owns the one place where `assign_match` calls go out to
//! referees and round-boundary broadcasts go out to players.

use std::time::Duration;

use league_protocol::envelope::MessageEnvelope;
use league_protocol::ids::{format_sender, Role};
use league_protocol::rpc::RpcParams;

use crate::models::{AssignMatchRequest, AssignMatchResponse, RoundAnnouncementAck, RoundAnnouncementBody};
use crate::scheduler::{build_schedule, RefereeSlot};
use crate::state::AppState;
use crate::tournament_state::{RoundState, TournamentState};

/// Builds the schedule from currently-registered players/referees and moves
/// the tournament into `Scheduling` then `RoundActive`, kicking off round one.
pub async fn start_league(state: &AppState) -> Result<usize, String> {
    let total_rounds = {
        let mut data = state.data.lock().await;
        data.tournament_state
            .transition(TournamentState::Scheduling)
            .map_err(|e| e.to_string())?;

        let players = data.registry.player_ids();
        let referees: Vec<RefereeSlot> = data
            .registry
            .referee_ids()
            .into_iter()
            .map(|id| {
                let max = data.registry.referee(&id).and_then(|a| a.identity.max_concurrent_matches);
                RefereeSlot { referee_id: id, max_concurrent_matches: max }
            })
            .collect();
        for player in &players {
            data.standings.init_player(player);
        }

        data.schedule = build_schedule(&players, &referees);
        let total_rounds = data.schedule.rounds.len();
        data.tournament_state.transition(TournamentState::RoundActive).map_err(|e| e.to_string())?;
        data.current_round_index = 0;
        total_rounds
    };

    tokio::spawn(run_round(state.clone()));
    Ok(total_rounds)
}

/// Announces the round to every player, dispatches each match to its referee,
/// then blocks until every match in the round has reported in. Recurses into
/// the next round (or closes out the league) on completion.
async fn run_round(state: AppState) {
    let (round, league_id) = {
        let mut data = state.data.lock().await;
        let Some(round) = data.schedule.rounds.get(data.current_round_index).cloned() else {
            data.tournament_state.transition(TournamentState::Completed).ok();
            tracing::info!("league completed: no further rounds");
            return;
        };
        if let Err(e) = data.round_state.transition(RoundState::Announced) {
            tracing::error!(error = %e, "cannot announce round");
            return;
        }
        data.outstanding.start_round(round.matches.iter().map(|m| m.match_id.clone()));
        (round, state.config.league_id.clone())
    };

    announce_round(&state, &round.round_id, &round.matches).await;

    {
        let mut data = state.data.lock().await;
        if let Err(e) = data.round_state.transition(RoundState::InProgress) {
            tracing::error!(error = %e, "cannot start round");
            return;
        }
    }

    for m in &round.matches {
        let (referee_endpoint, a_endpoint, b_endpoint) = {
            let data = state.data.lock().await;
            let referee = data.registry.referee(&m.referee_id).map(|a| a.identity.endpoint.clone());
            let a = data.registry.player(&m.player_a).map(|a| a.identity.endpoint.clone());
            let b = data.registry.player(&m.player_b).map(|a| a.identity.endpoint.clone());
            (referee, a, b)
        };
        let (Some(referee_endpoint), Some(a_endpoint), Some(b_endpoint)) = (referee_endpoint, a_endpoint, b_endpoint)
        else {
            tracing::error!(match_id = %m.match_id, "cannot dispatch match: unknown endpoint");
            continue;
        };

        let body = AssignMatchRequest {
            match_id: m.match_id.clone(),
            round_id: round.round_id.clone(),
            player_a: m.player_a.clone(),
            player_a_endpoint: a_endpoint,
            player_b: m.player_b.clone(),
            player_b_endpoint: b_endpoint,
            invitation_timeout_s: state.config.invitation_timeout_s,
            choice_timeout_s: state.config.choice_timeout_s,
        };
        let envelope = MessageEnvelope::new(
            league_protocol::envelope::MessageType::RoundAnnouncement,
            format_sender(Role::Manager, "MGR01"),
        )
        .with_league(league_id.clone())
        .with_round(round.round_id.clone())
        .with_match(m.match_id.clone());
        let params = RpcParams { envelope, body };

        let client = state.rpc_client(&referee_endpoint).await;
        let deadline = Duration::from_secs(state.config.invitation_timeout_s + state.config.choice_timeout_s);
        match client.call::<_, AssignMatchResponse>("assign_match", &params, deadline).await {
            Ok(resp) if resp.accepted => {}
            Ok(_) => tracing::warn!(match_id = %m.match_id, "referee rejected match assignment"),
            Err(e) => tracing::error!(match_id = %m.match_id, error = %e, "assign_match failed"),
        }
    }

    wait_for_round_completion(&state).await;

    let (is_league_complete, next_index) = {
        let mut data = state.data.lock().await;
        data.round_state.transition(RoundState::Completed).ok();
        data.current_round_index += 1;
        let done = data.current_round_index >= data.schedule.rounds.len();
        (done, data.current_round_index)
    };

    if is_league_complete {
        let mut data = state.data.lock().await;
        data.tournament_state.transition(TournamentState::Completed).ok();
        tracing::info!("league completed after {next_index} rounds");
        return;
    }

    {
        let mut data = state.data.lock().await;
        data.tournament_state.transition(TournamentState::RoundActive).ok();
        data.round_state = RoundState::Pending;
    }
    Box::pin(run_round(state)).await;
}

async fn announce_round(state: &AppState, round_id: &str, matches: &[crate::scheduler::Match]) {
    for m in matches {
        for (player_id, opponent_id) in [(&m.player_a, &m.player_b), (&m.player_b, &m.player_a)] {
            let endpoint = {
                let data = state.data.lock().await;
                data.registry.player(player_id).map(|a| a.identity.endpoint.clone())
            };
            let Some(endpoint) = endpoint else { continue };
            let envelope = MessageEnvelope::new(
                league_protocol::envelope::MessageType::RoundAnnouncement,
                format_sender(Role::Manager, "MGR01"),
            )
            .with_round(round_id.to_string())
            .with_match(m.match_id.clone());
            let body = RoundAnnouncementBody {
                round_id: round_id.to_string(),
                opponent_id: Some(opponent_id.clone()),
                match_id: Some(m.match_id.clone()),
            };
            let params = RpcParams { envelope, body };
            let client = state.rpc_client(&endpoint).await;
            let _ = client
                .call::<_, RoundAnnouncementAck>("round_announcement", &params, Duration::from_secs(5))
                .await;
        }
    }
}

async fn wait_for_round_completion(state: &AppState) {
    loop {
        let complete = {
            let data = state.data.lock().await;
            data.outstanding.is_round_complete()
        };
        if complete {
            return;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
}
