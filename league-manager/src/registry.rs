//! Agent registry: spec §4.2 registration. Owned exclusively by the Manager.

use std::collections::HashMap;

use league_protocol::auth::AuthToken;
use league_protocol::ids::{AgentIdentity, IdAllocator, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    CapacityReached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredAgent {
    pub identity: AgentIdentity,
    #[serde(skip_serializing)]
    pub token: String,
}

#[derive(Debug, Default)]
pub struct AgentRegistry {
    allocator: IdAllocator,
    players: HashMap<String, RegisteredAgent>,
    referees: HashMap<String, RegisteredAgent>,
    max_players: u32,
    max_referees: u32,
}

impl AgentRegistry {
    pub fn new(max_players: u32, max_referees: u32) -> Self {
        Self { allocator: IdAllocator::new(), players: HashMap::new(), referees: HashMap::new(), max_players, max_referees }
    }

    pub fn register_player(
        &mut self,
        display_name: String,
        endpoint: String,
        version: String,
    ) -> Result<RegisteredAgent, RegistrationError> {
        if self.players.len() as u32 >= self.max_players {
            return Err(RegistrationError::CapacityReached);
        }
        let id = self.allocator.allocate(Role::Player);
        let token = AuthToken::mint(Role::Player, &id);
        let identity = AgentIdentity {
            role: Role::Player,
            id: id.clone(),
            display_name,
            endpoint,
            version,
            game_types: vec![league_protocol::ids::GameType::EvenOdd],
            max_concurrent_matches: None,
        };
        let agent = RegisteredAgent { identity, token: token.as_str().to_string() };
        self.players.insert(id, agent.clone());
        Ok(agent)
    }

    pub fn register_referee(
        &mut self,
        display_name: String,
        endpoint: String,
        version: String,
        max_concurrent_matches: Option<u32>,
    ) -> Result<RegisteredAgent, RegistrationError> {
        if self.referees.len() as u32 >= self.max_referees {
            return Err(RegistrationError::CapacityReached);
        }
        let id = self.allocator.allocate(Role::Referee);
        let token = AuthToken::mint(Role::Referee, &id);
        let identity = AgentIdentity {
            role: Role::Referee,
            id: id.clone(),
            display_name,
            endpoint,
            version,
            game_types: vec![league_protocol::ids::GameType::EvenOdd],
            max_concurrent_matches,
        };
        let agent = RegisteredAgent { identity, token: token.as_str().to_string() };
        self.referees.insert(id, agent.clone());
        Ok(agent)
    }

    pub fn player_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.players.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn referee_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.referees.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn player(&self, id: &str) -> Option<&RegisteredAgent> {
        self.players.get(id)
    }

    pub fn referee(&self, id: &str) -> Option<&RegisteredAgent> {
        self.referees.get(id)
    }

    pub fn agent_by_sender(&self, role: Role, id: &str) -> Option<&RegisteredAgent> {
        match role {
            Role::Player => self.players.get(id),
            Role::Referee => self.referees.get(id),
            Role::Manager => None,
        }
    }

    /// Constant-time token verification for the sender identified by `role:id`.
    pub fn verify_token(&self, role: Role, id: &str, presented: &str) -> bool {
        match self.agent_by_sender(role, id) {
            Some(agent) => constant_time_eq(&agent.token, presented),
            None => false,
        }
    }
}

fn constant_time_eq(expected: &str, presented: &str) -> bool {
    use subtle::ConstantTimeEq;
    let a = expected.as_bytes();
    let b = presented.as_bytes();
    a.len() == b.len() && a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_players_with_sequential_ids_and_distinct_tokens() {
        let mut registry = AgentRegistry::new(10, 10);
        let p1 = registry.register_player("Alice".into(), "http://localhost:8101".into(), "1.0".into()).unwrap();
        let p2 = registry.register_player("Bob".into(), "http://localhost:8102".into(), "1.0".into()).unwrap();
        assert_eq!(p1.identity.id, "P01");
        assert_eq!(p2.identity.id, "P02");
        assert_ne!(p1.token, p2.token);
    }

    #[test]
    fn rejects_registration_past_capacity() {
        let mut registry = AgentRegistry::new(1, 10);
        registry.register_player("Alice".into(), "http://localhost:8101".into(), "1.0".into()).unwrap();
        let err = registry.register_player("Bob".into(), "http://localhost:8102".into(), "1.0".into());
        assert_eq!(err.unwrap_err(), RegistrationError::CapacityReached);
    }

    #[test]
    fn verify_token_requires_exact_match() {
        let mut registry = AgentRegistry::new(10, 10);
        let p1 = registry.register_player("Alice".into(), "http://localhost:8101".into(), "1.0".into()).unwrap();
        assert!(registry.verify_token(Role::Player, &p1.identity.id, &p1.token));
        assert!(!registry.verify_token(Role::Player, &p1.identity.id, "wrong"));
    }
}
