#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Lane Defence matches headlessly.

mod level;
mod snapshot_transfer;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use lane_defence_core::{Event, MatchOutcome, WaveStatus};
use lane_defence_simulation::{Simulation, MAX_SPEED_MULTIPLIER};
use lane_defence_world::query;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::level::{LevelPlan, PlannedDefender};

/// Plays a Lane Defence level without a renderer.
#[derive(Debug, Parser)]
#[command(name = "lane-defence", version, about)]
struct Cli {
    /// Level file describing the path, the economy and the opening build.
    level: PathBuf,
    /// Resume from a snapshot written by `--save` instead of the opening build.
    #[arg(long)]
    load: Option<PathBuf>,
    /// Write a snapshot of the match to this file when the session ends.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Number of waves to play in this session.
    #[arg(long)]
    waves: Option<u32>,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Factor applied to every tick.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Upper bound on ticks before the session is abandoned.
    #[arg(long, default_value_t = 500_000)]
    max_ticks: u64,
}

/// Entry point for the Lane Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    ensure!(cli.tick_ms > 0, "tick length must be positive");

    let plan = LevelPlan::load(&cli.level)?;
    let mut simulation = match &cli.load {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read snapshot at {}", path.display()))?;
            let state = snapshot_transfer::decode(&contents)
                .with_context(|| format!("failed to decode snapshot at {}", path.display()))?;
            Simulation::restore(&plan.config, &state, plan.validator.clone())
                .context("failed to restore match")?
        }
        None => {
            let mut simulation = Simulation::new(&plan.config, plan.validator.clone())
                .context("failed to create match")?;
            build_opening(&mut simulation, &plan.defenders);
            simulation
        }
    };
    ensure!(
        simulation.set_speed_multiplier(cli.speed),
        "speed multiplier must be positive and at most {MAX_SPEED_MULTIPLIER}"
    );

    println!("{}", query::welcome_banner(simulation.world()));
    let tally = play(
        &mut simulation,
        Duration::from_millis(cli.tick_ms),
        cli.waves,
        cli.max_ticks,
    );
    report(&simulation, &tally);

    if let Some(path) = &cli.save {
        let encoded = snapshot_transfer::encode(&simulation.persisted_state())
            .context("failed to encode snapshot")?;
        fs::write(path, encoded)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), "snapshot saved");
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_opening(simulation: &mut Simulation, defenders: &[PlannedDefender]) {
    for planned in defenders {
        let id = match simulation.place_defender(planned.kind, planned.position) {
            Ok(id) => id,
            Err(reason) => {
                warn!(
                    kind = planned.kind.identifier(),
                    position = ?planned.position,
                    %reason,
                    "skipping planned defender"
                );
                continue;
            }
        };
        if let Some(strategy) = planned.strategy {
            let _ = simulation.set_targeting_strategy(id, strategy);
        }
        for _ in 0..planned.upgrades {
            if let Err(reason) = simulation.upgrade_defender(id) {
                warn!(defender = id.get(), %reason, "planned upgrade skipped");
                break;
            }
        }
    }
    let _ = simulation.drain_events();
}

/// Running totals collected from drained events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    ticks: u64,
    kills: u32,
    leaks: u32,
    shots: u32,
    waves_cleared: u32,
}

impl Tally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::AttackerKilled { .. } => self.kills += 1,
                Event::AttackerLeaked { .. } => self.leaks += 1,
                Event::ProjectileFired { .. } => self.shots += 1,
                Event::WaveCompleted { wave, reward } => {
                    self.waves_cleared += 1;
                    info!(wave = wave.get(), reward, "wave cleared");
                }
                _ => {}
            }
        }
    }
}

fn play(
    simulation: &mut Simulation,
    dt: Duration,
    wave_limit: Option<u32>,
    max_ticks: u64,
) -> Tally {
    let mut tally = Tally::default();
    let mut waves_started = 0;

    while simulation.outcome() == MatchOutcome::InProgress && tally.ticks < max_ticks {
        match simulation.wave_progress().status {
            WaveStatus::Exhausted => break,
            WaveStatus::Idle => {
                if wave_limit.is_some_and(|limit| waves_started >= limit) {
                    break;
                }
                if simulation.start_next_wave() {
                    waves_started += 1;
                }
            }
            WaveStatus::InProgress => {}
        }

        simulation.tick(dt);
        tally.ticks += 1;
        tally.record(&simulation.drain_events());
    }

    if tally.ticks >= max_ticks {
        warn!(max_ticks, "session stopped at the tick limit");
    }
    tally
}

fn report(simulation: &Simulation, tally: &Tally) {
    let progress = simulation.wave_progress();
    let wave = progress.wave.map_or(0, |wave| wave.get());
    info!(
        outcome = ?simulation.outcome(),
        wave,
        total_waves = progress.total_waves,
        gold = simulation.gold(),
        lives = simulation.lives(),
        kills = tally.kills,
        leaks = tally.leaks,
        shots = tally.shots,
        waves_cleared = tally.waves_cleared,
        clock = ?simulation.clock(),
        "session finished"
    );
    println!(
        "{:?} after wave {wave}/{}: {} gold, {} lives, {} kills, {} leaks",
        simulation.outcome(),
        progress.total_waves,
        simulation.gold(),
        simulation.lives(),
        tally.kills,
        tally.leaks,
    );
}
