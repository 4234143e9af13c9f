use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, FromRepr, IntoStaticStr, VariantArray};

mod reward;

pub use reward::{RewardConfig, TickEvents};

/// A snapshot of the runner produced by the environment once per tick
///
/// Positions and velocities are continuous; the agent never mutates them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Horizontal (sideways) position
    pub player_x: f32,
    /// Vertical position
    pub player_y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// Velocity along the course axis, negative when moving towards the goal
    pub vel_z: f32,
    /// Remaining distance to the goal line, never negative
    pub distance_to_end: f32,
}

/// The fixed action set available to the agent
///
/// The discriminant is the index of the action's value in an action-value vector.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumCount,
    EnumIter,
    FromRepr,
    IntoStaticStr,
    VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Forward = 0,
    Backward = 1,
    Jump = 2,
    None = 3,
}

impl Action {
    /// Index of this action in an action-value vector
    pub fn index(self) -> usize {
        self as usize
    }

    /// Names of all actions in action-value order
    pub fn names() -> Vec<String> {
        Action::VARIANTS.iter().map(|a| a.to_string()).collect()
    }
}

/// What the environment reports after executing an action for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub observation: Observation,
    pub reward: f32,
    pub terminal: bool,
}

/// A tick-driven simulation the agent can be trained in
///
/// The environment owns physics, collisions and level layout; the agent only sees
/// [`Observation`]s and scalar rewards.
pub trait Environment {
    /// Reset the environment to the start of a new episode
    ///
    /// **Returns** the first observation of the episode
    fn reset(&mut self) -> Observation;

    /// Execute `action` for one tick
    ///
    /// **Returns** the resulting observation, the reward earned and whether the episode ended
    fn step(&mut self, action: Action) -> Tick;
}

#[cfg(test)]
pub(crate) mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use super::*;

    /// Observation that only differs in its distance to the goal
    pub fn at_distance(distance_to_end: f32) -> Observation {
        Observation {
            distance_to_end,
            ..Default::default()
        }
    }

    #[test]
    fn action_indices_are_dense() {
        assert_eq!(Action::COUNT, 4, "Four actions");
        for (i, action) in Action::iter().enumerate() {
            assert_eq!(action.index(), i, "Index matches declaration order");
            assert_eq!(Action::from_repr(i), Some(action), "Round trips from index");
        }
    }

    #[test]
    fn action_names() {
        assert_eq!(
            Action::names(),
            vec!["forward", "backward", "jump", "none"],
            "Names are lowercase and ordered"
        );
        let name: &'static str = Action::Jump.into();
        assert_eq!(name, "jump");
    }
}
