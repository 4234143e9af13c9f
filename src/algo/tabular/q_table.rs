use log::trace;

use crate::{
    algo::Transition,
    discretize::{Discretizer, DiscretizerConfig, StateKey},
    ds::{ActionValueTable, ActionValues},
    env::{Action, Observation},
    exploration::EpsilonGreedy,
    util::{ensure_interval, Bounds},
    Result,
};

/// Configuration for the [`QTableAgent`]
#[derive(Debug, Clone)]
pub struct QTableAgentConfig {
    /// Learning rate, in `(0, 1]`
    pub alpha: f32,
    /// Discount factor, in `[0, 1)`
    pub gamma: f32,
    pub discretizer: DiscretizerConfig,
    /// Seed for the exploration policy; `None` draws one from system entropy
    pub seed: Option<u64>,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            discretizer: DiscretizerConfig::default(),
            seed: None,
        }
    }
}

/// One-step Q-learning update
///
/// Q(s,a) ← Q(s,a) + α[r + γ max<sub>a'</sub> Q(s',a') - Q(s,a)], with the bootstrap term dropped on terminal steps.
/// Parameters are taken as given; range checks belong to whoever builds the learner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QLearner {
    pub alpha: f32,
    pub gamma: f32,
}

impl QLearner {
    pub fn new(alpha: f32, gamma: f32) -> Self {
        Self { alpha, gamma }
    }

    /// Apply the update for taking `action` in `state`
    ///
    /// `next_state` is `None` for terminal steps. Both states are created in `table` if unseen.
    ///
    /// **Returns** the updated value of `(state, action)`
    pub fn update(
        &self,
        table: &mut ActionValueTable,
        state: &StateKey,
        action: Action,
        reward: f32,
        next_state: Option<&StateKey>,
    ) -> f32 {
        let old = table.values(state)[action.index()];
        let target = match next_state {
            None => reward,
            Some(next) => {
                let max_next = table
                    .values(next)
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
                reward + self.gamma * max_next
            }
        };
        let new = old + self.alpha * (target - old);
        table.values(state)[action.index()] = new;
        new
    }
}

/// A Q-learning agent that learns a table of action values over discretized observations
///
/// Owns the value table; nothing else reads or writes it while the agent is alive.
#[derive(Debug, Clone)]
pub struct QTableAgent {
    discretizer: Discretizer,
    table: ActionValueTable,
    policy: EpsilonGreedy,
    learner: QLearner,
}

impl QTableAgent {
    /// Initialize a new `QTableAgent`
    ///
    /// **Errors** if `alpha` is not in `(0, 1]`, `gamma` is not in `[0, 1)`, or the discretizer is invalid
    pub fn new(config: QTableAgentConfig) -> Result<Self> {
        let QTableAgentConfig {
            alpha,
            gamma,
            discretizer,
            seed,
        } = config;
        ensure_interval!(alpha, 0.0, 1.0, Bounds::OpenLow);
        ensure_interval!(gamma, 0.0, 1.0, Bounds::OpenHigh);
        Ok(Self {
            discretizer: Discretizer::new(discretizer)?,
            table: ActionValueTable::new(),
            policy: EpsilonGreedy::new(seed),
            learner: QLearner::new(alpha, gamma),
        })
    }

    pub fn state_key(&self, observation: &Observation) -> StateKey {
        self.discretizer.discretize(observation)
    }

    /// Choose an action for `observation` with exploration rate `epsilon`
    pub fn act(&mut self, observation: &Observation, epsilon: f32) -> Action {
        let key = self.state_key(observation);
        self.act_on(&key, epsilon)
    }

    /// Choose an action for an already discretized state
    pub fn act_on(&mut self, key: &StateKey, epsilon: f32) -> Action {
        let values = *self.table.values(key);
        let action = self.policy.select(&values, epsilon);
        trace!("State {key} {values:?} -> {action}");
        action
    }

    /// Learn from a single transition
    ///
    /// **Returns** the updated action value
    pub fn learn(&mut self, transition: &Transition) -> f32 {
        let state = self.state_key(&transition.observation);
        let next_state = (!transition.terminal).then(|| self.state_key(&transition.next_observation));
        self.learner.update(
            &mut self.table,
            &state,
            transition.action,
            transition.reward,
            next_state.as_ref(),
        )
    }

    /// Count one visit of `key` for the exported table
    pub fn record_visit(&mut self, key: &StateKey) {
        self.table.visit(key);
    }

    pub fn values(&self, key: &StateKey) -> Option<&ActionValues> {
        self.table.get(key)
    }

    pub fn table(&self) -> &ActionValueTable {
        &self.table
    }

    pub fn learner(&self) -> QLearner {
        self.learner
    }

    /// Forget everything learned
    pub fn reset(&mut self) {
        self.table.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{discretize::DiscretizerConfig, env::tests::at_distance, Error};

    fn agent(alpha: f32, gamma: f32) -> QTableAgent {
        QTableAgent::new(QTableAgentConfig {
            alpha,
            gamma,
            discretizer: DiscretizerConfig::distance_only(10.0, 10),
            seed: Some(0),
        })
        .unwrap()
    }

    fn transition(from: f32, action: Action, reward: f32, to: f32, terminal: bool) -> Transition {
        Transition {
            observation: at_distance(from),
            action,
            reward,
            next_observation: at_distance(to),
            terminal,
        }
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        for (alpha, gamma) in [(0.0, 0.9), (1.1, 0.9), (0.5, 1.0), (0.5, -0.1)] {
            let result = QTableAgent::new(QTableAgentConfig {
                alpha,
                gamma,
                ..Default::default()
            });
            assert!(
                matches!(result, Err(Error::Configuration { .. })),
                "alpha {alpha}, gamma {gamma} rejected"
            );
        }
        assert!(QTableAgent::new(QTableAgentConfig {
            alpha: 1.0,
            gamma: 0.0,
            ..Default::default()
        })
        .is_ok());
    }

    #[test]
    fn terminal_update() {
        let mut agent = agent(0.5, 0.9);
        let key = agent.state_key(&at_distance(5.5));
        agent.table.values(&key)[Action::Jump.index()] = 2.0;

        let new = agent.learn(&transition(5.5, Action::Jump, 10.0, 4.5, true));
        assert_eq!(new, 2.0 + 0.5 * (10.0 - 2.0), "old + lr * (R - old)");
        assert_eq!(agent.table().len(), 1, "Terminal next state not created");
    }

    #[test]
    fn non_terminal_update_bootstraps_from_max() {
        let mut agent = agent(0.5, 0.9);
        let next = agent.state_key(&at_distance(4.5));
        *agent.table.values(&next) = [1.0, 4.0, -3.0, 2.0];

        let new = agent.learn(&transition(5.5, Action::Forward, -1.0, 4.5, false));
        assert_eq!(new, 0.5 * (-1.0 + 0.9 * 4.0), "Uses max over next actions");
        let key = agent.state_key(&at_distance(5.5));
        assert_eq!(agent.values(&key).unwrap()[0], new, "Stored in table");
    }

    #[test]
    fn off_policy_target_ignores_next_action() {
        let mut agent = agent(1.0, 0.5);
        let next = agent.state_key(&at_distance(1.5));
        *agent.table.values(&next) = [-5.0, 8.0, -5.0, -5.0];
        let new = agent.learn(&transition(2.5, Action::None, 0.0, 1.5, false));
        assert_eq!(new, 4.0, "Max, not the value of a sampled next action");
    }

    #[test]
    fn repeated_updates_converge() {
        let mut agent = agent(0.3, 0.9);
        let t = transition(5.5, Action::Forward, 10.0, 4.5, true);
        let mut prev_gap = f32::INFINITY;
        for _ in 0..30 {
            let gap = (agent.learn(&t) - 10.0).abs();
            assert!(gap < prev_gap, "Gap to target shrinks");
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-3, "Converged to target");
    }

    #[test]
    fn other_states_untouched() {
        let mut agent = agent(0.5, 0.9);
        let other = agent.state_key(&at_distance(9.5));
        *agent.table.values(&other) = [1.0, 2.0, 3.0, 4.0];
        agent.learn(&transition(5.5, Action::Forward, 10.0, 4.5, true));
        assert_eq!(*agent.values(&other).unwrap(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn act_creates_entry_without_changing_values() {
        let mut agent = agent(0.5, 0.9);
        let obs = at_distance(3.3);
        agent.act(&obs, 0.0);
        let key = agent.state_key(&obs);
        assert_eq!(agent.values(&key), Some(&[0.0; 4]), "Zeroed entry created");
        assert_eq!(agent.table().visits(&key), 0, "Acting alone does not count a visit");

        agent.record_visit(&key);
        assert_eq!(agent.table().visits(&key), 1);

        agent.reset();
        assert!(agent.table().is_empty(), "Reset clears table");
    }
}
