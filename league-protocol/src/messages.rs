//! Wire bodies carried inside [`crate::rpc::RpcParams`] for every method in the
//! recognized set (spec §6). Kept here, rather than duplicated per crate, since
//! both sides of most calls live in different binaries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// --- Registration -----------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterPlayerRequest {
    pub display_name: String,
    pub endpoint: String,
    pub version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegisterRefereeRequest {
    pub display_name: String,
    pub endpoint: String,
    pub version: String,
    pub max_concurrent_matches: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Registered,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub status: RegistrationStatus,
    pub assigned_id: Option<String>,
    pub auth_token: Option<String>,
    pub league_id: String,
}

// --- Tournament lifecycle ----------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StartLeagueRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartLeagueResponse {
    pub accepted: bool,
    pub total_rounds: usize,
}

/// Body of `assign_match`: the Manager dispatching one scheduled match to its referee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignMatchRequest {
    pub match_id: String,
    pub round_id: String,
    pub player_a: String,
    pub player_a_endpoint: String,
    pub player_b: String,
    pub player_b_endpoint: String,
    pub invitation_timeout_s: u64,
    pub choice_timeout_s: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignMatchResponse {
    pub accepted: bool,
}

/// Body of `ROUND_ANNOUNCEMENT`, broadcast fire-and-forget to every player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundAnnouncementBody {
    pub round_id: String,
    pub opponent_id: Option<String>,
    pub match_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundAnnouncementAck {
    pub acknowledged: bool,
}

// --- Referee <-> Player -------------------------------------------------

/// Phase 1: `handle_game_invitation`. Serves only as a synchronization barrier;
/// declining is not a supported strategy (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInvitationRequest {
    pub match_id: String,
    pub round_id: String,
    pub opponent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInvitationResponse {
    pub accept: bool,
    pub arrival_timestamp: String,
}

/// Phase 2: `choose_parity`. `opponent_history` is the caller's own prior
/// parity choices against this specific opponent, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseParityRequest {
    pub match_id: String,
    pub opponent_id: String,
    pub opponent_history: Vec<Parity>,
    pub standings_snapshot: HashMap<String, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(n: u8) -> Self {
        if n % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseParityResponse {
    pub parity: Parity,
}

/// Phase 5: `notify_match_result`. Best-effort, fire-and-forget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverNotification {
    pub match_id: String,
    pub round_id: String,
    pub player_a: String,
    pub player_b: String,
    pub choices: HashMap<String, Parity>,
    pub drawn_number: Option<u8>,
    pub winner_player_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameOverAck {
    pub acknowledged: bool,
}

// --- Referee -> Manager ---------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Completed,
    Aborted,
}

/// Phase 6: `report_match_result`, the authoritative completion signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResultReportRequest {
    pub match_id: String,
    pub round_id: String,
    pub player_a: String,
    pub player_b: String,
    pub choices: HashMap<String, Parity>,
    pub drawn_number: Option<u8>,
    pub winner_player_id: Option<String>,
    pub reason: String,
    pub status: MatchStatus,
    pub started_at: String,
    pub finished_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResultReportResponse {
    pub acknowledged: bool,
    pub duplicate: bool,
}

// --- Queries -----------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueQueryKind {
    Standings,
    RoundState,
    Schedule,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeagueQueryRequest {
    pub query: LeagueQueryKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingRow {
    pub player_id: String,
    pub rank: usize,
    pub standing: PlayerStanding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueQueryResponse {
    pub tournament_state: String,
    pub current_round: Option<String>,
    pub standings: Option<Vec<StandingRow>>,
    pub champion: Option<String>,
}
