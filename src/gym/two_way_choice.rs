use crate::env::{Action, Environment, Observation, Tick};

/// A one-state environment where every episode is a single decision
///
/// [`Action::Forward`] ends the episode with `reward`, any other action with `-reward`.
/// Useful for checking that the learner settles on the better action.
pub struct TwoWayChoice {
    reward: f32,
}

impl TwoWayChoice {
    pub fn new(reward: f32) -> Self {
        Self { reward }
    }

    fn observation() -> Observation {
        Observation {
            distance_to_end: 1.0,
            ..Default::default()
        }
    }
}

impl Environment for TwoWayChoice {
    fn reset(&mut self) -> Observation {
        Self::observation()
    }

    fn step(&mut self, action: Action) -> Tick {
        let reward = match action {
            Action::Forward => self.reward,
            _ => -self.reward,
        };
        Tick {
            observation: Self::observation(),
            reward,
            terminal: true,
        }
    }
}
