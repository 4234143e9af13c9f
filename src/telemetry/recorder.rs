use log::{info, warn};

use crate::{util::now_millis, Error, Result};

use super::{EpisodeRecord, Hyperparameters, QTableEntry, StepRecord, TrainingSession};

/// Collects step and episode records into a [`TrainingSession`]
///
/// A session opens with [`start_session`](Self::start_session) and closes with
/// [`finish_session`](Self::finish_session). Records arriving while no session is open are dropped.
/// The last session stays readable after it closes until the next one starts.
#[derive(Debug, Default)]
pub struct TelemetryRecorder {
    session: Option<TrainingSession>,
    recording: bool,
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// The current or most recently finished session
    pub fn session(&self) -> Option<&TrainingSession> {
        self.session.as_ref()
    }

    /// Open a new session, replacing any finished one
    ///
    /// **Returns** `false` without changes if a session is already open
    pub fn start_session(&mut self, parameters: Hyperparameters) -> bool {
        if self.recording {
            return false;
        }
        let start_time = now_millis();
        let session = TrainingSession::new(format!("rl_session_{start_time}"), start_time, parameters);
        info!("Started recording training session {}", session.session_id);
        self.session = Some(session);
        self.recording = true;
        true
    }

    fn open_session(&mut self) -> Option<&mut TrainingSession> {
        if self.recording {
            self.session.as_mut()
        } else {
            None
        }
    }

    pub fn record_step(&mut self, step: StepRecord) {
        if let Some(session) = self.open_session() {
            session.steps.push(step);
        }
    }

    pub fn record_episode(&mut self, episode: EpisodeRecord) {
        if let Some(session) = self.open_session() {
            session.episodes.push(episode);
        }
    }

    /// Attach the final table, freeze the summary and close the session
    ///
    /// **Returns** the finished session, or `None` if no session was open
    pub fn finish_session(
        &mut self,
        final_q_table: Vec<QTableEntry>,
        final_exploration_rate: f32,
    ) -> Option<&TrainingSession> {
        if !self.recording {
            warn!("finish_session called while not recording");
            return None;
        }
        self.recording = false;
        let session = self.session.as_mut()?;
        session.end_time = Some(now_millis());
        session.final_q_table = final_q_table;
        session.summary = session.summarize(final_exploration_rate);
        info!(
            "Finished training session {}: {} episodes, {} successful, mean reward {:.2}",
            session.session_id,
            session.summary.total_episodes,
            session.summary.successful_episodes,
            session.summary.average_reward,
        );
        Some(&*session)
    }

    /// A copy of the current session with a freshly computed summary
    ///
    /// `exploration_rate` is the rate currently in force. Recording continues unaffected.
    /// A finished session is returned as it was frozen.
    ///
    /// **Errors** with [`Error::NoSession`] if no session was ever started
    pub fn export_snapshot(&self, exploration_rate: f32) -> Result<TrainingSession> {
        let session = self.session.as_ref().ok_or(Error::NoSession)?;
        let mut snapshot = session.clone();
        if self.recording {
            snapshot.end_time = Some(now_millis());
            snapshot.summary = snapshot.summarize(exploration_rate);
        }
        Ok(snapshot)
    }
}
