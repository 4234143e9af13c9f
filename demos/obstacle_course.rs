use std::{
    fs::{self, File},
    io::BufWriter,
};

use course_rl::{
    config::TrainingConfig,
    gym::{CourseConfig, ObstacleCourse},
    orchestrator::EpisodeOrchestrator,
    telemetry::{write_episodes_csv, write_q_table_csv, Outcome},
};
use log::info;

fn main() -> course_rl::Result<()> {
    env_logger::init();
    const NUM_EPISODES: u32 = 2000;

    let config = TrainingConfig {
        learning_rate: 0.2,
        max_episode_steps: Some(3000),
        seed: Some(42),
        record_steps: false,
        ..Default::default()
    };
    let mut env = ObstacleCourse::new(CourseConfig {
        blocks: 6,
        seed: Some(7),
        rewards: config.rewards,
        ..Default::default()
    })?;
    info!("Course layout: {:?}", env.layout());

    let mut orchestrator = EpisodeOrchestrator::new(config)?;
    orchestrator.start_session();

    let mut goals = 0;
    for e in 0..NUM_EPISODES {
        let record = orchestrator.run_episode(&mut env)?;
        if record.outcome == Outcome::Goal {
            goals += 1;
        }
        if (e + 1) % 100 == 0 {
            let stats = orchestrator.stats();
            info!(
                "Episodes {}: {goals} goals in the last 100, epsilon {:.3}, {} states",
                e + 1,
                stats.exploration_rate,
                stats.q_table_size
            );
            goals = 0;
        }
    }

    let Some(session) = orchestrator.finish_session().cloned() else {
        return Ok(());
    };

    fs::create_dir_all("out")?;
    session.write_json(BufWriter::new(File::create(format!("out/{}.json", session.session_id))?))?;
    write_episodes_csv(&session, File::create("out/episodes.csv")?)?;
    write_q_table_csv(&session.final_q_table, File::create("out/q_table.csv")?)?;

    let summary = &session.summary;
    println!(
        "{} episodes, {} reached the goal, average reward {:.2}, {} states explored",
        summary.total_episodes,
        summary.successful_episodes,
        summary.average_reward,
        summary.states_explored
    );
    Ok(())
}
