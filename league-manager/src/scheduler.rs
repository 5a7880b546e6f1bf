//! Round-robin scheduler: spec §4.2.
//!
//! Enumerate every unordered player pair in canonical (lexicographic) order,
//! greedily place each pair into the earliest round where neither endpoint is
//! already scheduled, then assign referees cyclically across matches in
//! schedule order, skipping any referee already at capacity within its round.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: String,
    pub player_a: String,
    pub player_b: String,
    pub referee_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_id: String,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schedule {
    pub rounds: Vec<Round>,
}

#[derive(Debug, Clone)]
pub struct RefereeSlot {
    pub referee_id: String,
    pub max_concurrent_matches: Option<u32>,
}

/// Number of rounds a round-robin over `n` players needs: `n-1` if even, else `n`
/// (odd `n` gets a "bye" round where one player sits out each round).
pub fn round_count(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    if n % 2 == 0 {
        n - 1
    } else {
        n
    }
}

/// Builds the full schedule for `players` (already sorted or not — this function
/// sorts them) using `referees` for cyclic assignment.
pub fn build_schedule(players: &[String], referees: &[RefereeSlot]) -> Schedule {
    let mut sorted_players = players.to_vec();
    sorted_players.sort();

    let pairs = canonical_pairs(&sorted_players);
    let n_rounds = round_count(sorted_players.len()).max(1);

    let mut round_occupants: Vec<HashSet<String>> = vec![HashSet::new(); n_rounds];
    let mut round_pairs: Vec<Vec<(String, String)>> = vec![Vec::new(); n_rounds];

    for (a, b) in pairs {
        let round_idx = round_occupants
            .iter()
            .position(|occupants| !occupants.contains(&a) && !occupants.contains(&b))
            .expect("round-robin construction always has room for every pair");
        round_occupants[round_idx].insert(a.clone());
        round_occupants[round_idx].insert(b.clone());
        round_pairs[round_idx].push((a, b));
    }

    let mut rounds = Vec::with_capacity(n_rounds);
    let mut referee_cursor = 0usize;
    // Track assignment counts per referee *within the current round* for the cap check.
    for (round_number, pairs_in_round) in round_pairs.into_iter().enumerate() {
        let round_id = format!("R{}", round_number + 1);
        let mut matches = Vec::with_capacity(pairs_in_round.len());
        let mut counts_this_round: std::collections::HashMap<String, u32> = std::collections::HashMap::new();

        for (match_number, (a, b)) in pairs_in_round.into_iter().enumerate() {
            let referee_id = if referees.is_empty() {
                String::new()
            } else {
                pick_referee(referees, &mut referee_cursor, &mut counts_this_round)
            };
            let match_id = format!("{round_id}M{}", match_number + 1);
            matches.push(Match { match_id, player_a: a, player_b: b, referee_id });
        }

        rounds.push(Round { round_id, matches });
    }

    Schedule { rounds }
}

fn pick_referee(
    referees: &[RefereeSlot],
    cursor: &mut usize,
    counts_this_round: &mut std::collections::HashMap<String, u32>,
) -> String {
    for _ in 0..referees.len() {
        let candidate = &referees[*cursor % referees.len()];
        *cursor += 1;
        let used = counts_this_round.get(&candidate.referee_id).copied().unwrap_or(0);
        let has_room = match candidate.max_concurrent_matches {
            Some(cap) => used < cap,
            None => true,
        };
        if has_room {
            counts_this_round.insert(candidate.referee_id.clone(), used + 1);
            return candidate.referee_id.clone();
        }
    }
    // Every referee is at capacity for this round: fall back to plain round robin
    // rather than leaving a match unassigned.
    let candidate = &referees[*cursor % referees.len()];
    *cursor += 1;
    candidate.referee_id.clone()
}

/// All unordered pairs `{p, q}` with `p < q`, in lexicographic order on `(p, q)`.
fn canonical_pairs(sorted_players: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for i in 0..sorted_players.len() {
        for j in (i + 1)..sorted_players.len() {
            pairs.push((sorted_players[i].clone(), sorted_players[j].clone()));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("P{i:02}")).collect()
    }

    fn referees(n: usize) -> Vec<RefereeSlot> {
        (1..=n)
            .map(|i| RefereeSlot { referee_id: format!("REF{i:02}"), max_concurrent_matches: None })
            .collect()
    }

    #[test]
    fn four_players_produce_six_matches_over_three_rounds() {
        let schedule = build_schedule(&players(4), &referees(1));
        assert_eq!(schedule.rounds.len(), 3);
        let total_matches: usize = schedule.rounds.iter().map(|r| r.matches.len()).sum();
        assert_eq!(total_matches, 6);
    }

    #[test]
    fn every_pair_appears_exactly_once() {
        let n = 7;
        let schedule = build_schedule(&players(n), &referees(2));
        let mut seen = HashSet::new();
        for round in &schedule.rounds {
            for m in &round.matches {
                let key = if m.player_a < m.player_b {
                    (m.player_a.clone(), m.player_b.clone())
                } else {
                    (m.player_b.clone(), m.player_a.clone())
                };
                assert!(seen.insert(key), "pair scheduled twice");
            }
        }
        assert_eq!(seen.len(), n * (n - 1) / 2);
    }

    #[test]
    fn no_player_appears_twice_in_the_same_round() {
        let schedule = build_schedule(&players(6), &referees(2));
        for round in &schedule.rounds {
            let mut occupants = HashSet::new();
            for m in &round.matches {
                assert!(occupants.insert(m.player_a.clone()));
                assert!(occupants.insert(m.player_b.clone()));
            }
        }
    }

    #[test]
    fn odd_player_count_uses_n_rounds() {
        let schedule = build_schedule(&players(5), &referees(1));
        assert_eq!(schedule.rounds.len(), 5);
    }

    #[test]
    fn referee_assignment_cycles_and_respects_capacity() {
        let refs = vec![
            RefereeSlot { referee_id: "REF01".to_string(), max_concurrent_matches: Some(1) },
            RefereeSlot { referee_id: "REF02".to_string(), max_concurrent_matches: Some(1) },
        ];
        let schedule = build_schedule(&players(4), &refs);
        for round in &schedule.rounds {
            let mut counts: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
            for m in &round.matches {
                *counts.entry(m.referee_id.as_str()).or_insert(0) += 1;
            }
            for (_, count) in counts {
                assert!(count <= 1, "referee exceeded its per-round capacity");
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn every_schedule_is_a_valid_matching(n in 2usize..12) {
            let schedule = build_schedule(&players(n), &referees(3));
            let mut seen = HashSet::new();
            for round in &schedule.rounds {
                let mut occupants = HashSet::new();
                for m in &round.matches {
                    proptest::prop_assert!(occupants.insert(m.player_a.clone()));
                    proptest::prop_assert!(occupants.insert(m.player_b.clone()));
                    let key = if m.player_a < m.player_b {
                        (m.player_a.clone(), m.player_b.clone())
                    } else {
                        (m.player_b.clone(), m.player_a.clone())
                    };
                    proptest::prop_assert!(seen.insert(key));
                }
            }
            proptest::prop_assert_eq!(seen.len(), n * (n.saturating_sub(1)) / 2);
        }
    }
}
