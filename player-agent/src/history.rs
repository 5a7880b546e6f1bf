//! Match history and per-opponent profiles: spec §4.4. Each player exclusively
//! owns its own history; writes are atomic so a crash mid-append never leaves
//! a torn file.

use std::collections::HashMap;
use std::path::PathBuf;

use league_protocol::messages::Parity;
use league_protocol::persistence::{atomic_write_json, layout, read_json_with_retry, Envelope, PersistedHeader};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: String,
    pub round_id: String,
    pub opponent_id: String,
    pub own_choice: Option<Parity>,
    pub drawn_number: Option<u8>,
    pub won: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpponentProfile {
    pub matches_seen: u32,
    pub choice_counts: HashMap<String, u32>,
    /// Chronological record of the opponent's own parity choices, oldest first.
    pub choice_history: Vec<Parity>,
}

impl OpponentProfile {
    fn record_opponent_choice(&mut self, choice: Parity) {
        self.matches_seen += 1;
        *self.choice_counts.entry(choice.as_str().to_string()).or_insert(0) += 1;
        self.choice_history.push(choice);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryStore {
    pub records: Vec<MatchRecord>,
    pub opponents: HashMap<String, OpponentProfile>,
}

impl HistoryStore {
    pub fn opponent_history(&self, opponent_id: &str) -> &[Parity] {
        self.opponents.get(opponent_id).map(|p| p.choice_history.as_slice()).unwrap_or(&[])
    }

    /// Appends a completed match and updates the opponent's profile with the
    /// opponent's own choice (not ours) so future strategy calls see real data.
    pub fn record(&mut self, record: MatchRecord, opponent_choice: Option<Parity>) {
        let profile = self.opponents.entry(record.opponent_id.clone()).or_default();
        if let Some(choice) = opponent_choice {
            profile.record_opponent_choice(choice);
        }
        self.records.push(record);
    }
}

pub struct HistoryPaths {
    pub history_file: PathBuf,
}

impl HistoryPaths {
    pub fn new(data_dir: &std::path::Path, player_id: &str) -> Self {
        Self { history_file: layout::player_history_file(data_dir, player_id) }
    }
}

pub async fn load(paths: &HistoryPaths) -> HistoryStore {
    match read_json_with_retry::<Envelope<HistoryStore>>(&paths.history_file).await {
        Ok(envelope) => envelope.body,
        Err(_) => HistoryStore::default(),
    }
}

pub async fn save(paths: &HistoryPaths, player_id: &str, store: &HistoryStore) -> std::io::Result<()> {
    let envelope = Envelope { header: PersistedHeader::new(player_id, 1), body: store.clone() };
    atomic_write_json(&paths.history_file, &envelope).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_an_opponent_choice_updates_frequency_counts() {
        let mut store = HistoryStore::default();
        store.record(
            MatchRecord {
                match_id: "R1M1".to_string(),
                round_id: "R1".to_string(),
                opponent_id: "P02".to_string(),
                own_choice: Some(Parity::Odd),
                drawn_number: Some(3),
                won: true,
            },
            Some(Parity::Even),
        );
        let profile = store.opponents.get("P02").unwrap();
        assert_eq!(profile.matches_seen, 1);
        assert_eq!(profile.choice_counts.get("even"), Some(&1));
        assert_eq!(store.opponent_history("P02"), &[Parity::Even]);
    }
}
