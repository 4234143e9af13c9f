use crate::env::{Action, Observation};

pub mod tabular;

pub use tabular::q_table::{QLearner, QTableAgent, QTableAgentConfig};

/// A single (s, a, r, s', terminal) step, consumed once by a learner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// The observation the action was chosen from
    pub observation: Observation,
    /// The action taken
    pub action: Action,
    /// The reward received after taking the action
    pub reward: f32,
    /// The observation after the action was executed
    pub next_observation: Observation,
    /// Whether the episode ended with this step, in which case `next_observation` is not bootstrapped from
    pub terminal: bool,
}
