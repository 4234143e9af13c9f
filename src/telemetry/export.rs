use std::io::{Read, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use log::warn;

use crate::{util::now_millis, Result};

use super::{QTableEntry, TrainingSession};

fn iso8601(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

impl TrainingSession {
    /// Serialize the whole session as pretty-printed JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Write the episode table of `session` as CSV
///
/// The table is preceded by `#` comment lines naming the session, its parameters and the export time.
pub fn write_episodes_csv<W: Write>(session: &TrainingSession, mut writer: W) -> Result<()> {
    writeln!(writer, "# RL Training Session: {}", session.session_id)?;
    writeln!(writer, "# Parameters: {}", serde_json::to_string(&session.parameters)?)?;
    writeln!(writer, "# Snapshot taken at: {}", iso8601(now_millis()))?;
    writeln!(writer, "# Episodes recorded: {}", session.episodes.len())?;

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Episode",
        "TotalReward",
        "Steps",
        "Outcome",
        "FinalDistance",
        "Epsilon",
        "Timestamp",
    ])?;
    for ep in &session.episodes {
        wtr.write_record([
            ep.episode_number.to_string(),
            format!("{:.2}", ep.total_reward),
            ep.steps.to_string(),
            ep.outcome.to_string(),
            format!("{:.2}", ep.final_distance),
            format!("{:.4}", ep.exploration_rate),
            iso8601(ep.timestamp),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write Q-table entries as CSV, one row per state with a column per action and the visit count
pub fn write_q_table_csv<W: Write>(entries: &[QTableEntry], writer: W) -> Result<()> {
    if entries.is_empty() {
        warn!("Q-table is empty, exporting header only");
    }
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "State",
        "Action_Forward",
        "Action_Backward",
        "Action_Jump",
        "Action_None",
        "Visits",
    ])?;
    for entry in entries {
        let mut row = Vec::with_capacity(entry.action_values.len() + 2);
        row.push(entry.state_key.to_string());
        row.extend(entry.action_values.iter().map(|q| format!("{q:.4}")));
        row.push(entry.visit_count.to_string());
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}
