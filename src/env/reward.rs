use serde::{Deserialize, Serialize};

/// Reward magnitudes handed out by the environment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Terminal reward for crossing the goal line
    pub goal: f32,
    /// Terminal reward for falling off the course
    pub fall: f32,
    /// Added on a tick in which the runner hit an obstacle
    pub obstacle_hit: f32,
    /// Added on a tick in which the runner hit a wall
    pub wall_hit: f32,
    /// Reward per unit of simulated time, usually slightly negative
    pub per_tick: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            goal: 100.0,
            fall: -50.0,
            obstacle_hit: -10.0,
            wall_hit: -5.0,
            per_tick: -0.01,
        }
    }
}

/// Collision and timing facts gathered by the simulation during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickEvents {
    /// Simulated seconds covered by this tick
    pub scaled_delta: f32,
    pub obstacle_hit: bool,
    pub wall_hit: bool,
}

impl RewardConfig {
    /// Immediate reward for a non-terminal tick
    ///
    /// The per-tick term scales with simulated time so that the reward does not depend on frame rate.
    pub fn tick_reward(&self, events: TickEvents) -> f32 {
        let mut reward = self.per_tick * events.scaled_delta;
        if events.obstacle_hit {
            reward += self.obstacle_hit;
        }
        if events.wall_hit {
            reward += self.wall_hit;
        }
        reward
    }

    /// Terminal reward for a tick in which the runner reached the goal
    pub fn goal_reward(&self) -> f32 {
        self.goal
    }

    /// Terminal reward for a tick in which the runner fell off the course
    pub fn fall_reward(&self) -> f32 {
        self.fall
    }
}
