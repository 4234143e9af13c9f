//! Episode lifecycle
//!
//! The [`EpisodeOrchestrator`] sits between a tick-driven environment and the [`QTableAgent`].
//! Each tick delivers one observation; from the second tick of an episode onward it also
//! carries the reward and terminal flag earned by the previously emitted action.
//!
//! ```text
//! AwaitingFirstObservation --begin--> Stepping --step(terminal)--> EpisodeComplete
//!          ^                            |  ^                              |
//!          |                            +--+ step(non-terminal)           |
//!          +--------------------------------------------------------------+
//! ```

use log::{debug, info, trace};
use strum::{Display, IntoStaticStr};

use crate::{
    algo::{QTableAgent, Transition},
    config::TrainingConfig,
    decay::ExplorationSchedule,
    discretize::StateKey,
    ds::{ActionValues, RingBuffer},
    env::{Action, Environment, Observation},
    telemetry::{EpisodeRecord, Outcome, QTableEntry, StepRecord, TelemetryRecorder, TrainingSession},
    util::now_millis,
    Error, Result,
};

/// Where the orchestrator is within an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// No observation of the current episode has been seen yet
    AwaitingFirstObservation,
    /// An action was emitted and its outcome is pending
    Stepping,
    /// The episode is being finalized
    EpisodeComplete,
}

/// Result of feeding one tick to the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Execute this action before the next tick
    Continue(Action),
    /// The episode ended; the next tick starts a new one
    Finished(EpisodeRecord),
}

/// Live view of training progress
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingStats {
    /// Number of finished episodes
    pub episode_count: u32,
    /// Reward accumulated in the running episode
    pub total_reward: f32,
    pub exploration_rate: f32,
    pub q_table_size: usize,
    pub current_state_key: Option<StateKey>,
    pub current_action_values: Option<ActionValues>,
}

/// The cached half of a pending transition
#[derive(Debug, Clone)]
struct Pending {
    observation: Observation,
    key: StateKey,
    action: Action,
}

/// Drives the interaction between an environment and the agent
///
/// Owns the agent, the exploration schedule and the telemetry recorder for as long as training runs.
/// Every call completes synchronously within the tick that made it.
#[derive(Debug)]
pub struct EpisodeOrchestrator {
    config: TrainingConfig,
    agent: QTableAgent,
    schedule: ExplorationSchedule,
    recorder: TelemetryRecorder,
    phase: Phase,
    pending: Option<Pending>,
    exploration_rate: f32,
    episode: u32,
    episode_reward: f32,
    episode_steps: u32,
    events: RingBuffer<String>,
}

impl EpisodeOrchestrator {
    /// **Errors** with [`Error::Configuration`] if `config` does not validate
    pub fn new(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let agent = QTableAgent::new(config.agent_config())?;
        let schedule = ExplorationSchedule::new(config.exploration)?;
        Ok(Self {
            agent,
            exploration_rate: schedule.initial(),
            schedule,
            recorder: TelemetryRecorder::new(),
            phase: Phase::AwaitingFirstObservation,
            pending: None,
            episode: 0,
            episode_reward: 0.0,
            episode_steps: 0,
            events: RingBuffer::new(config.event_log_capacity),
            config,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn exploration_rate(&self) -> f32 {
        self.exploration_rate
    }

    /// Number of finished episodes
    pub fn episode_count(&self) -> u32 {
        self.episode
    }

    pub fn agent(&self) -> &QTableAgent {
        &self.agent
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn recorder(&self) -> &TelemetryRecorder {
        &self.recorder
    }

    /// Recent events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    fn event(&mut self, message: String) {
        debug!("{message}");
        self.events.push(message);
    }

    fn protocol_error(&self, expected: &'static str) -> Error {
        Error::OrchestratorState {
            expected,
            found: self.phase.into(),
        }
    }

    fn choose(&mut self, observation: Observation) -> Action {
        let key = self.agent.state_key(&observation);
        let action = self.agent.act_on(&key, self.exploration_rate);
        self.agent.record_visit(&key);
        self.pending = Some(Pending {
            observation,
            key,
            action,
        });
        action
    }

    /// Start an episode from its first observation
    ///
    /// No learning happens here since there is no transition yet.
    ///
    /// **Errors** with [`Error::OrchestratorState`] if an episode is already in progress
    pub fn begin(&mut self, observation: Observation) -> Result<Action> {
        if self.phase != Phase::AwaitingFirstObservation {
            return Err(self.protocol_error("awaiting_first_observation"));
        }
        let action = self.choose(observation);
        self.phase = Phase::Stepping;
        trace!("Episode {} started with {action}", self.episode);
        Ok(action)
    }

    /// Deliver the outcome of the last emitted action
    ///
    /// Learns from the completed transition, then either picks the next action or finalizes the episode.
    ///
    /// **Errors** with [`Error::OrchestratorState`] if no episode is in progress. The value table is left untouched.
    pub fn step(&mut self, observation: Observation, reward: f32, terminal: bool) -> Result<Step> {
        if self.phase != Phase::Stepping {
            return Err(self.protocol_error("stepping"));
        }
        let Some(pending) = self.pending.take() else {
            return Err(self.protocol_error("a cached previous observation"));
        };

        self.episode_steps += 1;
        self.episode_reward += reward;
        let timed_out = self
            .config
            .max_episode_steps
            .is_some_and(|max| self.episode_steps > max);
        let terminal = terminal || timed_out;

        let transition = Transition {
            observation: pending.observation,
            action: pending.action,
            reward,
            next_observation: observation,
            terminal,
        };
        self.agent.learn(&transition);

        if self.config.record_steps && self.recorder.is_recording() {
            let action_values = self.agent.values(&pending.key).copied().unwrap_or_default();
            self.recorder.record_step(StepRecord {
                episode_number: self.episode,
                step_number: self.episode_steps,
                state_key: pending.key,
                action: pending.action,
                reward,
                observation: pending.observation,
                action_values,
                exploration_rate: self.exploration_rate,
                timestamp: now_millis(),
            });
        }

        if terminal {
            Ok(Step::Finished(self.finish_episode(&observation, reward)))
        } else {
            Ok(Step::Continue(self.choose(observation)))
        }
    }

    /// Single per-tick entry point
    ///
    /// Starts an episode if none is running, otherwise behaves like [`step`](Self::step).
    /// `reward` is ignored on the first tick of an episode.
    ///
    /// **Errors** with [`Error::OrchestratorState`] if a terminal tick arrives before the episode's first observation
    pub fn observe(&mut self, observation: Observation, reward: f32, terminal: bool) -> Result<Step> {
        match self.phase {
            Phase::AwaitingFirstObservation if terminal => Err(self.protocol_error("stepping")),
            Phase::AwaitingFirstObservation => self.begin(observation).map(Step::Continue),
            _ => self.step(observation, reward, terminal),
        }
    }

    /// End the running episode early, as if the environment reported a terminal tick with zero reward
    ///
    /// **Returns** the finished episode, or `None` if no episode was running
    pub fn restart(&mut self, observation: Observation) -> Result<Option<EpisodeRecord>> {
        if self.phase == Phase::AwaitingFirstObservation {
            return Ok(None);
        }
        match self.step(observation, 0.0, true)? {
            Step::Finished(record) => Ok(Some(record)),
            Step::Continue(_) => Ok(None),
        }
    }

    fn classify(&self, terminal_reward: f32) -> Outcome {
        if terminal_reward > self.config.success_threshold {
            Outcome::Goal
        } else if self
            .config
            .max_episode_steps
            .is_some_and(|max| self.episode_steps > max)
        {
            Outcome::Timeout
        } else {
            Outcome::Fall
        }
    }

    fn finish_episode(&mut self, observation: &Observation, terminal_reward: f32) -> EpisodeRecord {
        self.phase = Phase::EpisodeComplete;

        let record = EpisodeRecord {
            episode_number: self.episode,
            total_reward: self.episode_reward,
            steps: self.episode_steps,
            outcome: self.classify(terminal_reward),
            final_distance: observation.distance_to_end,
            exploration_rate: self.exploration_rate,
            timestamp: now_millis(),
        };
        self.recorder.record_episode(record.clone());

        info!(
            "Episode {} ended: {} after {} steps, total reward {:.2}, epsilon {:.4}, {} states",
            record.episode_number,
            record.outcome,
            record.steps,
            record.total_reward,
            record.exploration_rate,
            self.agent.table().len(),
        );
        self.event(format!(
            "Episode {} ended: {}, total {:.2}",
            record.episode_number, record.outcome, record.total_reward
        ));

        self.exploration_rate = self.schedule.decay(self.exploration_rate);
        self.episode += 1;
        self.episode_reward = 0.0;
        self.episode_steps = 0;
        self.pending = None;
        self.phase = Phase::AwaitingFirstObservation;
        record
    }

    /// Drive one full episode against `env`
    pub fn run_episode<E: Environment>(&mut self, env: &mut E) -> Result<EpisodeRecord> {
        let mut action = self.begin(env.reset())?;
        loop {
            let tick = env.step(action);
            match self.step(tick.observation, tick.reward, tick.terminal)? {
                Step::Continue(next) => action = next,
                Step::Finished(record) => return Ok(record),
            }
        }
    }

    /// Open a telemetry session with the current hyperparameters
    ///
    /// **Returns** `false` if a session is already open
    pub fn start_session(&mut self) -> bool {
        self.recorder.start_session(self.config.hyperparameters())
    }

    /// Close the telemetry session, attaching a snapshot of the value table
    pub fn finish_session(&mut self) -> Option<&TrainingSession> {
        let table = QTableEntry::snapshot(self.agent.table(), self.config.snapshot_limit);
        self.recorder.finish_session(table, self.exploration_rate)
    }

    /// Copy of the current session without interrupting recording
    pub fn export_snapshot(&self) -> Result<TrainingSession> {
        self.recorder.export_snapshot(self.exploration_rate)
    }

    pub fn stats(&self) -> TrainingStats {
        let current_state_key = self.pending.as_ref().map(|p| p.key.clone());
        let current_action_values = current_state_key
            .as_ref()
            .and_then(|k| self.agent.values(k).copied());
        TrainingStats {
            episode_count: self.episode,
            total_reward: self.episode_reward,
            exploration_rate: self.exploration_rate,
            q_table_size: self.agent.table().len(),
            current_state_key,
            current_action_values,
        }
    }

    /// Forget everything learned and restart exploration
    ///
    /// An open telemetry session is finished first, with the table as it was before the reset,
    /// so episode numbers within a session never repeat.
    pub fn reset(&mut self) {
        if self.recorder.is_recording() {
            self.finish_session();
        }
        self.agent.reset();
        self.exploration_rate = self.schedule.reset();
        self.episode = 0;
        self.episode_reward = 0.0;
        self.episode_steps = 0;
        self.pending = None;
        self.phase = Phase::AwaitingFirstObservation;
        self.events.clear();
        self.event("Training reset".to_string());
    }
}
