//! Strategy engine (spec §4.5): pluggable `choose(...)` producing the next
//! parity call. Baselines share one interface so the configured strategy can
//! be swapped without touching the RPC handler.

use std::collections::HashMap;

use league_protocol::config::AdaptiveConfig;
use league_protocol::messages::Parity;
use rand::Rng;
use statrs::distribution::{ChiSquared, ContinuousCDF};

pub trait Strategy: Send + Sync {
    fn choose(&self, opponent_id: &str, opponent_history: &[Parity], standings: &HashMap<String, u32>) -> Parity;
}

/// The Nash-equilibrium baseline: unconditionally uniform, unexploitable,
/// exactly 0.5 expected win rate against any opponent.
pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn choose(&self, _opponent_id: &str, _opponent_history: &[Parity], _standings: &HashMap<String, u32>) -> Parity {
        if rand::rng().random_bool(0.5) {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

/// Looks for a statistically significant skew in the opponent's own parity
/// choices and, when found, plays the parity the opponent under-weights.
/// Below `min_samples` observations, or when the skew isn't significant at
/// `alpha`, falls back to [`RandomStrategy`].
pub struct AdaptiveStrategy {
    config: AdaptiveConfig,
}

impl AdaptiveStrategy {
    pub fn new(config: AdaptiveConfig) -> Self {
        Self { config }
    }
}

impl Strategy for AdaptiveStrategy {
    fn choose(&self, opponent_id: &str, opponent_history: &[Parity], standings: &HashMap<String, u32>) -> Parity {
        let n = opponent_history.len();
        if n < self.config.min_samples {
            return RandomStrategy.choose(opponent_id, opponent_history, standings);
        }

        let n_even = opponent_history.iter().filter(|p| **p == Parity::Even).count();
        let n_odd = n - n_even;

        let expected = n as f64 / 2.0;
        let chi_sq = ((n_even as f64 - expected).powi(2) + (n_odd as f64 - expected).powi(2)) / expected;
        // One degree of freedom: two categories minus one constraint.
        let distribution = ChiSquared::new(1.0).expect("degrees of freedom 1.0 is always valid");
        let p_value = 1.0 - distribution.cdf(chi_sq);

        if p_value >= self.config.alpha {
            return RandomStrategy.choose(opponent_id, opponent_history, standings);
        }

        // Opponent is biased: play the parity they chose less often.
        if n_even < n_odd {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

pub fn build(kind: &str, config: AdaptiveConfig) -> Box<dyn Strategy> {
    match kind {
        "adaptive" => Box::new(AdaptiveStrategy::new(config)),
        _ => Box::new(RandomStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AdaptiveConfig {
        AdaptiveConfig { min_samples: 5, alpha: 0.05 }
    }

    #[test]
    fn defers_to_random_below_min_samples() {
        let strategy = AdaptiveStrategy::new(config());
        let history = vec![Parity::Even, Parity::Even];
        let standings = HashMap::new();
        // Can't assert a specific value since Random is non-deterministic, but
        // it must not panic and must return a valid parity either way.
        let choice = strategy.choose("P02", &history, &standings);
        assert!(matches!(choice, Parity::Even | Parity::Odd));
    }

    #[test]
    fn detects_a_strongly_biased_opponent() {
        let strategy = AdaptiveStrategy::new(config());
        // 20 observations, all "even": heavily biased, should play "odd".
        let history: Vec<Parity> = std::iter::repeat(Parity::Even).take(20).collect();
        let choice = strategy.choose("P02", &history, &HashMap::new());
        assert_eq!(choice, Parity::Odd);
    }

    #[test]
    fn uniform_history_defers_to_random_via_high_p_value() {
        let strategy = AdaptiveStrategy::new(config());
        let mut history = Vec::new();
        for i in 0..20 {
            history.push(if i % 2 == 0 { Parity::Even } else { Parity::Odd });
        }
        // A perfectly alternating history has chi-sq == 0, p-value == 1, well
        // above alpha, so this must not panic and must return a valid parity.
        let choice = strategy.choose("P02", &history, &HashMap::new());
        assert!(matches!(choice, Parity::Even | Parity::Odd));
    }
}
