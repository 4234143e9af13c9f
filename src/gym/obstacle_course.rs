use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{
    env::{Action, Environment, Observation, RewardConfig, Tick, TickEvents},
    Error, Result,
};

const GRAVITY: f32 = 9.81;
const ACCELERATION: f32 = 10.0;
const DAMPING: f32 = 0.5;
const JUMP_SPEED: f32 = 5.0;
const RADIUS: f32 = 0.3;
const HALF_WIDTH: f32 = 2.0;
/// Half the depth of a hurdle along the course
const HURDLE_DEPTH: f32 = 0.3;
const FALL_HEIGHT: f32 = -4.0;

/// A section of the course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Floor,
    /// No ground; the runner has to jump across
    Gap,
    /// Floor with a barrier across its middle
    Hurdle,
}

/// Settings for an [`ObstacleCourse`]
#[derive(Debug, Clone)]
pub struct CourseConfig {
    /// Number of blocks between start and goal
    pub blocks: usize,
    pub block_length: f32,
    pub gap_probability: f64,
    pub hurdle_probability: f64,
    pub hurdle_height: f32,
    /// Standard deviation of the sideways velocity noise added each tick
    pub lateral_drift: f32,
    /// Simulated seconds per tick
    pub dt: f32,
    /// Generate a new layout on every reset
    pub randomize_each_episode: bool,
    pub seed: Option<u64>,
    pub rewards: RewardConfig,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            blocks: 10,
            block_length: 4.0,
            gap_probability: 0.2,
            hurdle_probability: 0.3,
            hurdle_height: 0.6,
            lateral_drift: 0.05,
            dt: 1.0 / 60.0,
            randomize_each_episode: false,
            seed: None,
            rewards: RewardConfig::default(),
        }
    }
}

/// A kinematic stand-in for the 3D obstacle course
///
/// The runner starts at `z = 0` and heads towards negative `z`; the goal line sits at
/// `z = -blocks * block_length`. Falling below `y = -4` ends the episode.
pub struct ObstacleCourse {
    config: CourseConfig,
    layout: Vec<Block>,
    rng: StdRng,
    drift: Normal<f32>,
    pos: [f32; 3],
    vel: [f32; 3],
    touching_hurdle: bool,
}

impl ObstacleCourse {
    /// Initialize a course with a generated layout
    pub fn new(config: CourseConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layout = generate(&config, &mut rng)?;
        Self::build(config, layout, rng)
    }

    /// Initialize a course with a fixed layout
    pub fn with_layout(config: CourseConfig, layout: Vec<Block>) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_default());
        Self::build(config, layout, rng)
    }

    fn build(config: CourseConfig, layout: Vec<Block>, rng: StdRng) -> Result<Self> {
        if layout.is_empty() || config.block_length <= 0.0 || config.dt <= 0.0 {
            return Err(Error::configuration(
                "course",
                layout.len(),
                "needs at least one block of positive length and a positive tick",
            ));
        }
        let drift = Normal::new(0.0, config.lateral_drift)
            .map_err(|e| Error::configuration("lateral_drift", config.lateral_drift, e.to_string()))?;
        Ok(Self {
            config,
            layout,
            rng,
            drift,
            pos: [0.0, RADIUS, 0.0],
            vel: [0.0; 3],
            touching_hurdle: false,
        })
    }

    pub fn layout(&self) -> &[Block] {
        &self.layout
    }

    fn goal_z(&self) -> f32 {
        -(self.layout.len() as f32) * self.config.block_length
    }

    /// Block under `z`; the start pad behind the first block is floor for one block length
    fn block_at(&self, z: f32) -> Block {
        if z > 0.0 {
            return if z <= self.config.block_length {
                Block::Floor
            } else {
                Block::Gap
            };
        }
        let ix = (-z / self.config.block_length) as usize;
        self.layout.get(ix).copied().unwrap_or(Block::Floor)
    }

    fn hurdle_center(&self, z: f32) -> f32 {
        let ix = (-z / self.config.block_length).floor();
        -(ix + 0.5) * self.config.block_length
    }

    fn grounded(&self) -> bool {
        self.block_at(self.pos[2]) != Block::Gap && (self.pos[1] - RADIUS).abs() < 1e-3
    }

    fn observation(&self) -> Observation {
        let [x, y, z] = self.pos;
        let [vx, vy, vz] = self.vel;
        Observation {
            player_x: x,
            player_y: y,
            vel_x: vx,
            vel_y: vy,
            vel_z: vz,
            distance_to_end: (z - self.goal_z()).max(0.0),
        }
    }
}

/// Random layout whose first and last blocks are floor and whose gaps are never adjacent
fn generate(config: &CourseConfig, rng: &mut impl Rng) -> Result<Vec<Block>> {
    let p_gap = config.gap_probability;
    let p_hurdle = config.hurdle_probability;
    if !(0.0..=1.0).contains(&p_gap) || !(0.0..=1.0).contains(&p_hurdle) || p_gap + p_hurdle > 1.0 {
        return Err(Error::configuration(
            "gap_probability + hurdle_probability",
            p_gap + p_hurdle,
            "probabilities must be in [0, 1] and sum to at most 1",
        ));
    }
    let mut layout = Vec::with_capacity(config.blocks);
    for i in 0..config.blocks {
        let edge = i == 0 || i + 1 == config.blocks;
        let r = rng.gen::<f64>();
        let block = if edge {
            Block::Floor
        } else if r < p_gap && layout.last() != Some(&Block::Gap) {
            Block::Gap
        } else if r < p_gap + p_hurdle {
            Block::Hurdle
        } else {
            Block::Floor
        };
        layout.push(block);
    }
    Ok(layout)
}

impl Environment for ObstacleCourse {
    fn reset(&mut self) -> Observation {
        if self.config.randomize_each_episode {
            if let Ok(layout) = generate(&self.config, &mut self.rng) {
                self.layout = layout;
            }
        }
        self.pos = [0.0, RADIUS, 0.0];
        self.vel = [0.0; 3];
        self.touching_hurdle = false;
        self.observation()
    }

    fn step(&mut self, action: Action) -> Tick {
        let dt = self.config.dt;
        let mut events = TickEvents {
            scaled_delta: dt,
            ..Default::default()
        };

        match action {
            Action::Forward => self.vel[2] -= ACCELERATION * dt,
            Action::Backward => self.vel[2] += ACCELERATION * dt,
            Action::Jump if self.grounded() => self.vel[1] = JUMP_SPEED,
            Action::Jump | Action::None => {}
        }

        self.vel[0] += self.drift.sample(&mut self.rng);
        self.vel[0] *= 1.0 - DAMPING * dt;
        self.vel[2] *= 1.0 - DAMPING * dt;
        self.vel[1] -= GRAVITY * dt;
        for (p, v) in self.pos.iter_mut().zip(self.vel) {
            *p += v * dt;
        }

        let [x, y, z] = self.pos;

        // Land unless already sunk below the surface
        if self.block_at(z) != Block::Gap && y < RADIUS && y > RADIUS - 0.5 {
            self.pos[1] = RADIUS;
            self.vel[1] = self.vel[1].max(0.0);
        }

        if x.abs() > HALF_WIDTH {
            self.pos[0] = x.clamp(-HALF_WIDTH, HALF_WIDTH);
            self.vel[0] *= -0.5;
            events.wall_hit = true;
        }

        let center = self.hurdle_center(z);
        let inside_hurdle = self.block_at(z) == Block::Hurdle
            && (z - center).abs() < HURDLE_DEPTH
            && self.pos[1] - RADIUS < self.config.hurdle_height;
        if inside_hurdle {
            events.obstacle_hit = !self.touching_hurdle;
            self.pos[2] = center + HURDLE_DEPTH;
            self.vel[2] = self.vel[2].max(0.0);
        }
        self.touching_hurdle = inside_hurdle;

        let observation = self.observation();
        let rewards = &self.config.rewards;
        let (reward, terminal) = if self.pos[2] <= self.goal_z() {
            (rewards.goal_reward(), true)
        } else if self.pos[1] < FALL_HEIGHT {
            (rewards.fall_reward(), true)
        } else {
            (rewards.tick_reward(events), false)
        };

        Tick {
            observation,
            reward,
            terminal,
        }
    }
}
