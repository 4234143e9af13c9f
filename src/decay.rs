use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    util::{ensure_interval, Bounds},
    Error, Result,
};

/// Exploration rate settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Rate at the start of training
    pub initial: f32,
    /// Floor the rate never decays below
    pub minimum: f32,
    /// Multiplier applied once per finished episode
    pub decay_factor: f32,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            initial: 1.0,
            minimum: 0.05,
            decay_factor: 0.99,
        }
    }
}

impl ExplorationConfig {
    pub fn validate(&self) -> Result<()> {
        let &Self {
            initial,
            minimum,
            decay_factor,
        } = self;
        ensure_interval!(decay_factor, 0.0, 1.0, Bounds::OpenLow);
        ensure_interval!(minimum, 0.0, 1.0);
        if !(initial >= minimum && initial <= 1.0) {
            return Err(Error::configuration(
                "initial",
                initial,
                format!("must be in the interval [{minimum}, 1]"),
            ));
        }
        Ok(())
    }
}

/// Multiplicative, floored decay of the exploration rate
///
/// v<sub>t+1</sub> = max(v<sub>t</sub> * r, v<sub>min</sub>), applied once per finished episode
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorationSchedule {
    initial: f32,
    minimum: f32,
    factor: f32,
}

impl ExplorationSchedule {
    /// **Errors** if `decay_factor` is not in `(0, 1]`, `minimum` not in `[0, 1]`,
    /// or `initial` not in `[minimum, 1]`
    pub fn new(config: ExplorationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            initial: config.initial,
            minimum: config.minimum,
            factor: config.decay_factor,
        })
    }

    pub fn initial(&self) -> f32 {
        self.initial
    }

    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    /// Advance the rate by one decay step
    pub fn decay(&self, rate: f32) -> f32 {
        let next = (rate * self.factor).max(self.minimum).min(1.0);
        debug!("Exploration rate {rate:.4} -> {next:.4}");
        next
    }

    /// Rate to restart exploration from
    pub fn reset(&self) -> f32 {
        1.0
    }
}
