//! Recording of training sessions for offline analysis
//!
//! A [`TelemetryRecorder`] accumulates [`StepRecord`]s and [`EpisodeRecord`]s into a
//! [`TrainingSession`], which serializes to JSON and CSV through the functions in this module.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    discretize::StateKey,
    ds::{ActionValueTable, ActionValues},
    env::{Action, Observation, RewardConfig},
};

mod export;
mod recorder;

pub use export::{write_episodes_csv, write_q_table_csv};
pub use recorder::TelemetryRecorder;

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Goal,
    Fall,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub episode_number: u32,
    pub total_reward: f32,
    pub steps: u32,
    pub outcome: Outcome,
    pub final_distance: f32,
    /// Exploration rate in effect during the episode
    pub exploration_rate: f32,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub episode_number: u32,
    pub step_number: u32,
    pub state_key: StateKey,
    pub action: Action,
    pub reward: f32,
    pub observation: Observation,
    /// Values of `state_key` after the step was learned from
    pub action_values: ActionValues,
    pub exploration_rate: f32,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QTableEntry {
    pub state_key: StateKey,
    pub action_values: ActionValues,
    pub action_names: Vec<String>,
    pub visit_count: u32,
}

impl QTableEntry {
    /// Copy up to `max_entries` entries of `table` in first-seen order
    pub fn snapshot(table: &ActionValueTable, max_entries: usize) -> Vec<QTableEntry> {
        let names = Action::names();
        table
            .entries()
            .take(max_entries)
            .map(|e| QTableEntry {
                state_key: e.key.clone(),
                action_values: e.values,
                action_names: names.clone(),
                visit_count: e.visits,
            })
            .collect()
    }
}

/// Hyperparameters active when a session started
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperparameters {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub initial_exploration_rate: f32,
    pub minimum_exploration_rate: f32,
    pub exploration_decay: f32,
    pub rewards: RewardConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_episodes: usize,
    pub successful_episodes: usize,
    pub average_reward: f32,
    /// Mean step count over episodes that reached the goal, 0 if none did
    pub average_steps_to_goal: f32,
    pub final_exploration_rate: f32,
    pub states_explored: usize,
}

impl SessionSummary {
    /// Derive summary statistics from recorded episodes
    pub fn compute(episodes: &[EpisodeRecord], states_explored: usize, final_exploration_rate: f32) -> Self {
        let total_episodes = episodes.len();
        let average_reward = if total_episodes > 0 {
            episodes.iter().map(|e| e.total_reward).sum::<f32>() / total_episodes as f32
        } else {
            0.0
        };

        let successes = episodes
            .iter()
            .filter(|e| e.outcome == Outcome::Goal)
            .collect::<Vec<_>>();
        let average_steps_to_goal = if successes.is_empty() {
            0.0
        } else {
            successes.iter().map(|e| e.steps as f32).sum::<f32>() / successes.len() as f32
        };

        Self {
            total_episodes,
            successful_episodes: successes.len(),
            average_reward,
            average_steps_to_goal,
            final_exploration_rate,
            states_explored,
        }
    }
}

/// An append-only log of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    pub session_id: String,
    pub start_time: i64,
    /// Set when the session is finished, or to the export time on snapshots
    pub end_time: Option<i64>,
    pub parameters: Hyperparameters,
    pub episodes: Vec<EpisodeRecord>,
    pub steps: Vec<StepRecord>,
    pub final_q_table: Vec<QTableEntry>,
    pub summary: SessionSummary,
}

impl TrainingSession {
    pub fn new(session_id: String, start_time: i64, parameters: Hyperparameters) -> Self {
        Self {
            session_id,
            start_time,
            end_time: None,
            parameters,
            episodes: Vec::new(),
            steps: Vec::new(),
            final_q_table: Vec::new(),
            summary: SessionSummary::default(),
        }
    }

    /// States seen so far: the final table if one was attached, otherwise the distinct keys of recorded steps
    pub fn states_explored(&self) -> usize {
        if !self.final_q_table.is_empty() {
            return self.final_q_table.len();
        }
        self.steps
            .iter()
            .map(|s| &s.state_key)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Recompute the summary from the records currently held
    pub fn summarize(&self, final_exploration_rate: f32) -> SessionSummary {
        SessionSummary::compute(&self.episodes, self.states_explored(), final_exploration_rate)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn episode(number: u32, outcome: Outcome, total_reward: f32, steps: u32) -> EpisodeRecord {
        EpisodeRecord {
            episode_number: number,
            total_reward,
            steps,
            outcome,
            final_distance: 0.0,
            exploration_rate: 0.5,
            timestamp: 1_700_000_000_000,
        }
    }

    pub fn parameters() -> Hyperparameters {
        Hyperparameters {
            learning_rate: 0.1,
            discount_factor: 0.95,
            initial_exploration_rate: 1.0,
            minimum_exploration_rate: 0.05,
            exploration_decay: 0.99,
            rewards: RewardConfig::default(),
        }
    }

    #[test]
    fn summary_statistics() {
        let episodes = [
            episode(0, Outcome::Goal, 90.0, 100),
            episode(1, Outcome::Fall, -50.0, 20),
            episode(2, Outcome::Goal, 80.0, 200),
            episode(3, Outcome::Timeout, -20.0, 5000),
        ];
        let summary = SessionSummary::compute(&episodes, 12, 0.3);
        assert_eq!(summary.total_episodes, 4);
        assert_eq!(summary.successful_episodes, 2);
        assert_eq!(summary.average_reward, 25.0, "Mean over all episodes");
        assert_eq!(summary.average_steps_to_goal, 150.0, "Mean over successes only");
        assert_eq!(summary.states_explored, 12);
        assert_eq!(summary.final_exploration_rate, 0.3);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = SessionSummary::compute(&[], 0, 1.0);
        assert_eq!(summary.average_reward, 0.0);
        assert_eq!(summary.average_steps_to_goal, 0.0);
    }

    #[test]
    fn schema_field_names() {
        let value = serde_json::to_value(episode(3, Outcome::Timeout, 1.0, 2)).unwrap();
        assert_eq!(value["episodeNumber"], 3);
        assert_eq!(value["outcome"], "timeout");
        assert!(value.get("finalDistance").is_some());

        let mut table = ActionValueTable::new();
        table.visit(&StateKey::new(vec![4, 1]));
        let entry = &QTableEntry::snapshot(&table, 10)[0];
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["stateKey"], "4_1");
        assert_eq!(value["visitCount"], 1);
        assert_eq!(value["actionNames"][2], "jump");
    }
}
