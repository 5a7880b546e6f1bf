//! Every RPC carries a [`MessageEnvelope`] alongside its JSON-RPC params/result.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::time::now_compact;

pub const PROTOCOL_VERSION: &str = "league.v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    RefereeRegisterRequest,
    RefereeRegisterResponse,
    LeagueRegisterRequest,
    LeagueRegisterResponse,
    RoundAnnouncement,
    GameInvitation,
    GameJoinAck,
    ChooseParityCall,
    ChooseParityResponse,
    GameOver,
    MatchResultReport,
    LeagueStandingsUpdate,
    RoundCompleted,
    LeagueCompleted,
    LeagueError,
    GameError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub protocol: String,
    pub message_type: MessageType,
    pub sender: String,
    pub timestamp: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub league_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
}

impl MessageEnvelope {
    pub fn new(message_type: MessageType, sender: impl Into<String>) -> Self {
        Self {
            protocol: PROTOCOL_VERSION.to_string(),
            message_type,
            sender: sender.into(),
            timestamp: now_compact(),
            conversation_id: Uuid::new_v4().to_string(),
            auth_token: None,
            league_id: None,
            round_id: None,
            match_id: None,
        }
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_league(mut self, league_id: impl Into<String>) -> Self {
        self.league_id = Some(league_id.into());
        self
    }

    pub fn with_round(mut self, round_id: impl Into<String>) -> Self {
        self.round_id = Some(round_id.into());
        self
    }

    pub fn with_match(mut self, match_id: impl Into<String>) -> Self {
        self.match_id = Some(match_id.into());
        self
    }

    /// A reply envelope shares the request's `conversation_id` so the caller can
    /// correlate out-of-band responses; `match_id`/`round_id` carry over too.
    pub fn reply(&self, message_type: MessageType, sender: impl Into<String>) -> Self {
        Self {
            protocol: PROTOCOL_VERSION.to_string(),
            message_type,
            sender: sender.into(),
            timestamp: now_compact(),
            conversation_id: self.conversation_id.clone(),
            auth_token: None,
            league_id: self.league_id.clone(),
            round_id: self.round_id.clone(),
            match_id: self.match_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_preserves_conversation_and_match_ids() {
        let req = MessageEnvelope::new(MessageType::ChooseParityCall, "referee:REF01")
            .with_match("R1M1")
            .with_round("R1");
        let resp = req.reply(MessageType::ChooseParityResponse, "player:P01");
        assert_eq!(resp.conversation_id, req.conversation_id);
        assert_eq!(resp.match_id, req.match_id);
        assert_eq!(resp.round_id, req.round_id);
    }
}
