//! Agent identity, created once on successful registration and immutable thereafter.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Referee,
    Player,
}

impl Role {
    /// Prefix used both in assigned ids (`P03`, `REF01`) and in minted tokens.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Role::Manager => "MGR",
            Role::Referee => "REF",
            Role::Player => "P",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Referee => "referee",
            Role::Player => "player",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "manager" => Some(Role::Manager),
            "referee" => Some(Role::Referee),
            "player" => Some(Role::Player),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    EvenOdd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub role: Role,
    pub id: String,
    pub display_name: String,
    pub endpoint: String,
    pub version: String,
    pub game_types: Vec<GameType>,
    pub max_concurrent_matches: Option<u32>,
}

/// `sender` field on every envelope is `<role>:<id>`.
pub fn format_sender(role: Role, id: &str) -> String {
    format!("{}:{}", role.as_str(), id)
}

pub fn parse_sender(sender: &str) -> Option<(Role, &str)> {
    let (role_str, id) = sender.split_once(':')?;
    let role = Role::parse(role_str)?;
    Some((role, id))
}

/// Hands out sequential, zero-padded ids per role (`P01`, `P02`, ..., `REF01`, ...).
/// Owned exclusively by the League Manager's registry.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: std::collections::HashMap<&'static str, u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, role: Role) -> String {
        let prefix = role.id_prefix();
        let counter = self.next.entry(prefix).or_insert(0);
        *counter += 1;
        format!("{prefix}{:02}", *counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequential_zero_padded_ids() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.allocate(Role::Player), "P01");
        assert_eq!(alloc.allocate(Role::Player), "P02");
        assert_eq!(alloc.allocate(Role::Referee), "REF01");
        assert_eq!(alloc.allocate(Role::Player), "P03");
    }

    #[test]
    fn sender_round_trips() {
        let sender = format_sender(Role::Referee, "REF01");
        assert_eq!(sender, "referee:REF01");
        assert_eq!(parse_sender(&sender), Some((Role::Referee, "REF01")));
    }
}
