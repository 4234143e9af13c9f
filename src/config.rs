//! Training configuration
//!
//! Everything the settings layer can tune lives in [`TrainingConfig`]. It deserializes from
//! partial JSON documents, filling unspecified values with defaults, and is validated as a whole
//! before any training component is built from it.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{
    algo::QTableAgentConfig,
    decay::ExplorationConfig,
    discretize::DiscretizerConfig,
    env::RewardConfig,
    telemetry::Hyperparameters,
    util::{ensure_interval, Bounds},
    Error, Result,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Learning rate α, in `(0, 1]`
    pub learning_rate: f32,
    /// Discount factor γ, in `[0, 1)`
    pub discount_factor: f32,
    pub exploration: ExplorationConfig,
    pub rewards: RewardConfig,
    pub discretizer: DiscretizerConfig,
    /// A terminal reward above this counts as reaching the goal
    pub success_threshold: f32,
    /// Episodes running longer than this many steps end as timeouts; `None` disables the limit
    pub max_episode_steps: Option<u32>,
    /// Seed for action selection; `None` draws one from system entropy
    pub seed: Option<u64>,
    /// Maximum number of table entries attached to a finished session
    pub snapshot_limit: usize,
    /// Number of recent events kept for display
    pub event_log_capacity: usize,
    /// Record each step, not only episode summaries
    pub record_steps: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            exploration: ExplorationConfig::default(),
            rewards: RewardConfig::default(),
            discretizer: DiscretizerConfig::default(),
            success_threshold: 0.0,
            max_episode_steps: Some(5000),
            seed: None,
            snapshot_limit: 1000,
            event_log_capacity: 100,
            record_steps: true,
        }
    }
}

impl TrainingConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// **Errors** with [`Error::Configuration`] on the first out-of-range value
    pub fn validate(&self) -> Result<()> {
        let &Self {
            learning_rate,
            discount_factor,
            snapshot_limit,
            event_log_capacity,
            max_episode_steps,
            ..
        } = self;
        ensure_interval!(learning_rate, 0.0, 1.0, Bounds::OpenLow);
        ensure_interval!(discount_factor, 0.0, 1.0, Bounds::OpenHigh);
        self.exploration.validate()?;
        self.discretizer.validate()?;
        if snapshot_limit == 0 {
            return Err(Error::configuration("snapshot_limit", snapshot_limit, "must be positive"));
        }
        if event_log_capacity == 0 {
            return Err(Error::configuration(
                "event_log_capacity",
                event_log_capacity,
                "must be positive",
            ));
        }
        if max_episode_steps == Some(0) {
            return Err(Error::configuration("max_episode_steps", 0, "must be positive"));
        }
        Ok(())
    }

    pub fn agent_config(&self) -> QTableAgentConfig {
        QTableAgentConfig {
            alpha: self.learning_rate,
            gamma: self.discount_factor,
            discretizer: self.discretizer.clone(),
            seed: self.seed,
        }
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            initial_exploration_rate: self.exploration.initial,
            minimum_exploration_rate: self.exploration.minimum,
            exploration_decay: self.exploration.decay_factor,
            rewards: self.rewards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretize::{Field, FieldBins};

    #[test]
    fn defaults_are_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = TrainingConfig::from_json_str(
            r#"{ "learning_rate": 0.5, "exploration": { "minimum": 0.01 }, "rewards": { "goal": 10 } }"#,
        )
        .unwrap();
        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.discount_factor, 0.95, "Default kept");
        assert_eq!(config.exploration.minimum, 0.01);
        assert_eq!(config.exploration.decay_factor, 0.99, "Nested default kept");
        assert_eq!(config.rewards.goal, 10.0);
        assert_eq!(config.rewards.fall, -50.0);
    }

    #[test]
    fn discretizer_from_json() {
        let config = TrainingConfig::from_json_str(
            r#"{ "discretizer": [ { "field": "distance_to_end", "min": 0, "max": 30, "bins": 6 } ] }"#,
        )
        .unwrap();
        assert_eq!(
            config.discretizer.fields,
            vec![FieldBins::new(Field::DistanceToEnd, 0.0, 30.0, 6)]
        );
    }

    #[test]
    fn out_of_range_values_fail_fast() {
        let cases = [
            r#"{ "learning_rate": 0.0 }"#,
            r#"{ "discount_factor": 1.0 }"#,
            r#"{ "exploration": { "decay_factor": 0.0 } }"#,
            r#"{ "discretizer": [ { "field": "distance_to_end", "min": 0, "max": 30, "bins": 0 } ] }"#,
            r#"{ "snapshot_limit": 0 }"#,
            r#"{ "max_episode_steps": 0 }"#,
        ];
        for json in cases {
            assert!(
                matches!(TrainingConfig::from_json_str(json), Err(Error::Configuration { .. })),
                "{json} rejected"
            );
        }
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        assert!(matches!(
            TrainingConfig::from_json_str("{ nope"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn hyperparameters_mirror_config() {
        let config = TrainingConfig::default();
        let params = config.hyperparameters();
        assert_eq!(params.learning_rate, 0.1);
        assert_eq!(params.initial_exploration_rate, 1.0);
        assert_eq!(params.rewards, RewardConfig::default());
    }
}
