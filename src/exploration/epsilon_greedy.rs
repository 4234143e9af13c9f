use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use strum::{EnumCount, VariantArray};

use crate::{ds::ActionValues, env::Action};

use super::Choice;

/// Epsilon greedy exploration policy
///
/// The exploration rate is supplied on every call; scheduling it is the caller's concern.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<R: Rng = StdRng> {
    rng: R,
}

impl EpsilonGreedy<StdRng> {
    /// Policy seeded from `seed`, or from system entropy if `None`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl<R: Rng> EpsilonGreedy<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Draw once against `epsilon`: a sample below it explores
    pub fn choose(&mut self, epsilon: f32) -> Choice {
        if self.rng.gen::<f32>() < epsilon {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }

    /// Pick an action for a state with the given action values
    pub fn select(&mut self, values: &ActionValues, epsilon: f32) -> Action {
        match self.choose(epsilon) {
            Choice::Explore => self.random_action(),
            Choice::Exploit => self.greedy(values),
        }
    }

    /// Uniformly random action from the full action set
    pub fn random_action(&mut self) -> Action {
        Action::VARIANTS[self.rng.gen_range(0..Action::COUNT)]
    }

    /// An action with the highest value, breaking ties uniformly at random
    pub fn greedy(&mut self, values: &ActionValues) -> Action {
        let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let best = Action::VARIANTS
            .iter()
            .copied()
            .filter(|a| values[a.index()] == max)
            .collect::<Vec<_>>();
        match best.choose(&mut self.rng) {
            Some(&action) => action,
            // every value is NaN
            None => self.random_action(),
        }
    }
}

#[cfg(test)]
mod tests {
    use statrs::distribution::{ChiSquared, ContinuousCDF};
    use strum::EnumCount;

    use super::*;

    const TRIALS: usize = 8000;

    fn counts(policy: &mut EpsilonGreedy, values: &ActionValues, epsilon: f32) -> [usize; 4] {
        let mut counts = [0; Action::COUNT];
        for _ in 0..TRIALS {
            counts[policy.select(values, epsilon).index()] += 1;
        }
        counts
    }

    #[test]
    fn full_exploration_is_uniform() {
        let mut policy = EpsilonGreedy::new(Some(7));
        let values = [5.0, 0.0, 0.0, 0.0];
        let counts = counts(&mut policy, &values, 1.0);

        let expected = TRIALS as f64 / Action::COUNT as f64;
        let statistic: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        let critical = ChiSquared::new((Action::COUNT - 1) as f64)
            .unwrap()
            .inverse_cdf(0.999);
        assert!(
            statistic < critical,
            "Counts {counts:?} not uniform (chi2 {statistic} >= {critical})"
        );
    }

    #[test]
    fn random_action_reaches_every_action() {
        let mut policy = EpsilonGreedy::new(Some(11));
        let mut seen = [false; Action::COUNT];
        for _ in 0..200 {
            seen[policy.random_action().index()] = true;
        }
        assert_eq!(seen, [true; Action::COUNT], "Every action drawn");
    }

    #[test]
    fn no_exploration_is_greedy() {
        let mut policy = EpsilonGreedy::new(Some(1));
        let values = [0.5, -1.0, 2.0, 1.9];
        for _ in 0..1000 {
            assert_eq!(policy.select(&values, 0.0), Action::Jump, "Highest value chosen");
        }
    }

    #[test]
    fn ties_are_broken_randomly() {
        let mut policy = EpsilonGreedy::new(Some(3));
        let values = [1.0, 1.0, 0.0, -2.0];
        let counts = counts(&mut policy, &values, 0.0);
        assert!(counts[0] > 0 && counts[1] > 0, "Both tied actions chosen: {counts:?}");
        assert_eq!(counts[2] + counts[3], 0, "Worse actions never chosen");
    }

    #[test]
    fn all_zero_values_use_every_action() {
        let mut policy = EpsilonGreedy::new(Some(11));
        let counts = counts(&mut policy, &[0.0; 4], 0.0);
        assert!(counts.iter().all(|&c| c > 0), "No first-index bias: {counts:?}");
    }

    #[test]
    fn seeded_policies_agree() {
        let mut a = EpsilonGreedy::new(Some(42));
        let mut b = EpsilonGreedy::new(Some(42));
        let values = [0.0; 4];
        for _ in 0..100 {
            assert_eq!(a.select(&values, 0.5), b.select(&values, 0.5), "Reproducible");
        }
    }
}
