//! Tracks outstanding matches for the round currently in progress and enforces
//! at-most-once completion per `match_id` (spec §4.2 failure semantics, §9
//! decision on the referee-crash / reschedule open question).

use std::collections::{HashMap, HashSet};

pub use league_protocol::messages::MatchStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: String,
    pub player_a: String,
    pub player_b: String,
    pub winner: Option<String>,
    pub drawn_number: Option<u8>,
    pub reason: String,
    pub status: MatchStatus,
}

#[derive(Debug, Default)]
pub struct OutstandingMatches {
    outstanding: HashSet<String>,
    completed: HashMap<String, MatchResult>,
}

pub enum ReportOutcome {
    Applied,
    DuplicateIgnored,
}

impl OutstandingMatches {
    pub fn start_round(&mut self, match_ids: impl IntoIterator<Item = String>) {
        self.outstanding = match_ids.into_iter().collect();
    }

    pub fn is_round_complete(&self) -> bool {
        self.outstanding.is_empty()
    }

    pub fn remaining(&self) -> &HashSet<String> {
        &self.outstanding
    }

    /// Records a match result. Idempotent: a second report for an already-closed
    /// `match_id` (e.g. a stray report from a crashed-then-reassigned referee
    /// that was actually the loser of the race) is accepted but not re-applied.
    pub fn record(&mut self, result: MatchResult) -> ReportOutcome {
        if self.completed.contains_key(&result.match_id) {
            tracing::warn!(match_id = %result.match_id, "duplicate match result ignored");
            return ReportOutcome::DuplicateIgnored;
        }
        self.outstanding.remove(&result.match_id);
        self.completed.insert(result.match_id.clone(), result);
        ReportOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(match_id: &str) -> MatchResult {
        MatchResult {
            match_id: match_id.to_string(),
            player_a: "P01".to_string(),
            player_b: "P02".to_string(),
            winner: Some("P01".to_string()),
            drawn_number: Some(3),
            reason: "P01 matched the drawn parity".to_string(),
            status: MatchStatus::Completed,
        }
    }

    #[test]
    fn round_completes_once_every_match_reports() {
        let mut tracker = OutstandingMatches::default();
        tracker.start_round(["R1M1".to_string(), "R1M2".to_string()]);
        assert!(!tracker.is_round_complete());
        tracker.record(result("R1M1"));
        assert!(!tracker.is_round_complete());
        tracker.record(result("R1M2"));
        assert!(tracker.is_round_complete());
    }

    #[test]
    fn duplicate_report_is_ignored_not_double_applied() {
        let mut tracker = OutstandingMatches::default();
        tracker.start_round(["R1M1".to_string()]);
        matches!(tracker.record(result("R1M1")), ReportOutcome::Applied);
        matches!(tracker.record(result("R1M1")), ReportOutcome::DuplicateIgnored);
        assert!(tracker.is_round_complete());
    }
}
