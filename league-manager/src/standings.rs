//! Standings engine: spec §4.2. The entire view is rebuilt and atomically
//! replaced on every mutation so concurrent readers never observe a partial update.

use std::collections::HashMap;

use league_protocol::config::ScoringConfig;
pub use league_protocol::messages::PlayerStanding;
use serde::{Deserialize, Serialize};

trait RecomputePoints {
    fn recompute_points(&mut self, scoring: &ScoringConfig);
}

impl RecomputePoints for PlayerStanding {
    fn recompute_points(&mut self, scoring: &ScoringConfig) {
        self.points = scoring.win * self.wins + scoring.draw * self.draws + scoring.loss * self.losses;
    }
}

/// Outcome of a single match from one player's perspective, applied atomically
/// to both participants. This game never produces a genuine draw — a parity
/// call always resolves to a winner unless both players fail, in which case
/// the match is a double-abort `NoContest`: it still counts toward `played`
/// but awards neither player points (spec §7 scenario 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Win,
    Loss,
    NoContest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Standings {
    players: HashMap<String, PlayerStanding>,
    /// Winner of the (unique) match between each unordered pair, keyed by
    /// `unordered_key`; `None` for a double-abort (this game has no draws).
    /// Used only for the head-to-head tie-break. A plain `String` key, not a
    /// tuple, because `serde_json` map keys must serialize as strings.
    head_to_head: HashMap<String, Option<String>>,
}

impl Standings {
    pub fn init_player(&mut self, player_id: &str) {
        self.players.entry(player_id.to_string()).or_default();
    }

    pub fn get(&self, player_id: &str) -> Option<PlayerStanding> {
        self.players.get(player_id).copied()
    }

    pub fn all(&self) -> &HashMap<String, PlayerStanding> {
        &self.players
    }

    /// Applies a completed or technically-decided match to both players'
    /// records in one atomic step and records the head-to-head winner.
    pub fn apply_result(
        &mut self,
        scoring: &ScoringConfig,
        player_a: &str,
        player_b: &str,
        winner: Option<&str>,
    ) {
        let (outcome_a, outcome_b) = match winner {
            Some(w) if w == player_a => (MatchOutcome::Win, MatchOutcome::Loss),
            Some(w) if w == player_b => (MatchOutcome::Loss, MatchOutcome::Win),
            _ => (MatchOutcome::NoContest, MatchOutcome::NoContest),
        };

        self.apply_one(scoring, player_a, outcome_a);
        self.apply_one(scoring, player_b, outcome_b);

        let key = unordered_key(player_a, player_b);
        self.head_to_head.insert(key, winner.map(|w| w.to_string()));
    }

    fn apply_one(&mut self, scoring: &ScoringConfig, player_id: &str, outcome: MatchOutcome) {
        let entry = self.players.entry(player_id.to_string()).or_default();
        entry.played += 1;
        match outcome {
            MatchOutcome::Win => entry.wins += 1,
            MatchOutcome::Loss => entry.losses += 1,
            // A double-abort counts toward `played` only; it awards no points,
            // so neither `wins`, `losses`, nor `draws` changes.
            MatchOutcome::NoContest => {}
        }
        entry.recompute_points(scoring);
    }

    /// Ranks players by: (1) points desc, (2) head-to-head points when exactly
    /// two players are tied, (3) player_id ascending as the final fallback.
    pub fn ranked(&self) -> Vec<(String, PlayerStanding)> {
        let mut entries: Vec<(String, PlayerStanding)> =
            self.players.iter().map(|(id, s)| (id.clone(), *s)).collect();
        entries.sort_by(|a, b| b.1.points.cmp(&a.1.points).then_with(|| a.0.cmp(&b.0)));

        // Group by points, then resolve each group's internal order.
        let mut by_points: Vec<Vec<(String, PlayerStanding)>> = Vec::new();
        for entry in entries {
            match by_points.last_mut() {
                Some(group) if group[0].1.points == entry.1.points => group.push(entry),
                _ => by_points.push(vec![entry]),
            }
        }
        by_points.sort_by(|a, b| b[0].1.points.cmp(&a[0].1.points));

        let mut ranked = Vec::new();
        for mut group in by_points {
            if group.len() == 2 {
                let (id_a, id_b) = (group[0].0.clone(), group[1].0.clone());
                if let Some(winner) = self.head_to_head.get(&unordered_key(&id_a, &id_b)).cloned().flatten() {
                    group.sort_by_key(|(id, _)| if *id == winner { 0 } else { 1 });
                    ranked.extend(group);
                    continue;
                }
            }
            group.sort_by(|a, b| a.0.cmp(&b.0));
            ranked.extend(group);
        }
        ranked
    }

    pub fn champion(&self) -> Option<String> {
        self.ranked().into_iter().next().map(|(id, _)| id)
    }
}

fn unordered_key(a: &str, b: &str) -> String {
    if a < b {
        format!("{a}|{b}")
    } else {
        format!("{b}|{a}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scoring() -> ScoringConfig {
        ScoringConfig { win: 3, draw: 1, loss: 0 }
    }

    #[test]
    fn points_equal_three_times_wins_plus_draws() {
        let mut s = Standings::default();
        s.apply_result(&scoring(), "P01", "P02", Some("P01"));
        let p1 = s.get("P01").unwrap();
        assert_eq!(p1.points, 3);
        assert_eq!(p1.played, 1);
        let p2 = s.get("P02").unwrap();
        assert_eq!(p2.points, 0);
        assert_eq!(p2.losses, 1);
    }

    #[test]
    fn played_equals_wins_plus_losses_plus_draws_for_decided_matches() {
        let mut s = Standings::default();
        s.apply_result(&scoring(), "P01", "P02", Some("P01"));
        let p1 = s.get("P01").unwrap();
        assert_eq!(p1.played, p1.wins + p1.losses + p1.draws);
    }

    #[test]
    fn double_abort_counts_as_played_but_awards_no_points() {
        let mut s = Standings::default();
        s.apply_result(&scoring(), "P01", "P03", None);
        let p1 = s.get("P01").unwrap();
        let p3 = s.get("P03").unwrap();
        assert_eq!(p1.played, 1);
        assert_eq!(p1.wins + p1.losses + p1.draws, 0);
        assert_eq!(p1.points, 0);
        assert_eq!(p3.played, 1);
        assert_eq!(p3.points, 0);
    }

    #[test]
    fn ranking_breaks_ties_by_head_to_head_when_exactly_two_tied() {
        let mut tied = Standings::default();
        tied.apply_result(&scoring(), "P01", "P02", Some("P01")); // head-to-head: P01 over P02
        tied.apply_result(&scoring(), "P01", "P99", Some("P99")); // P01 loses its other match
        tied.apply_result(&scoring(), "P02", "P98", Some("P02")); // P02 wins its other match
        // Both P01 and P02 now sit on 3 points, differing only by who won head-to-head.
        assert_eq!(tied.get("P01").unwrap().points, 3);
        assert_eq!(tied.get("P02").unwrap().points, 3);
        let ranked = tied.ranked();
        let p1_rank = ranked.iter().position(|(id, _)| id == "P01").unwrap();
        let p2_rank = ranked.iter().position(|(id, _)| id == "P02").unwrap();
        assert!(p1_rank < p2_rank, "head-to-head winner must rank above the loser when tied");
    }

    #[test]
    fn ranking_falls_back_to_player_id_when_more_than_two_tied() {
        let mut s = Standings::default();
        s.init_player("P03");
        s.init_player("P01");
        s.init_player("P02");
        let ranked = s.ranked();
        let ids: Vec<&str> = ranked.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["P01", "P02", "P03"]);
    }

    #[test]
    fn champion_is_top_ranked_player() {
        let mut s = Standings::default();
        s.apply_result(&scoring(), "P01", "P02", Some("P01"));
        assert_eq!(s.champion(), Some("P01".to_string()));
    }
}
