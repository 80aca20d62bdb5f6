//! Yarn Chain headless runner
//!
//! Plays one session on the default spiral track with a scripted shooter and
//! prints a summary. Handy for checking a tuning or stage file before it
//! ships.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use yarn_chain::consts::*;
use yarn_chain::sim::{ChainEvent, ChainState, Color, Outcome, ProjectileHit, TickInput, tick};
use yarn_chain::{ChainTuning, ConfigError, Difficulty, PolylinePath, StageSet};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Tuning JSON file. Built-in defaults are used when omitted.
    tuning: Option<PathBuf>,
    /// Stage catalog JSON file
    #[arg(long, value_name = "FILE")]
    stages: Option<PathBuf>,
    /// Stage label, matched by difficulty (for example "easy" or "Game_Hard")
    #[arg(long, value_name = "LABEL", default_value = "easy")]
    stage: String,
    /// Session seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,
    /// Seconds between two shots
    #[arg(long, value_name = "SECONDS", default_value_t = 0.6)]
    fire_interval: f32,
    /// Stop after this much simulated time
    #[arg(long, value_name = "SECONDS", default_value_t = 180.0)]
    max_seconds: f32,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = CliArgs::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), ConfigError> {
    let tuning = match &args.tuning {
        Some(path) => ChainTuning::load(path)?,
        None => ChainTuning::default(),
    };
    let stages = match &args.stages {
        Some(path) => StageSet::load(path)?,
        None => StageSet::default(),
    };
    let path = PolylinePath::spiral(
        Vec2::ZERO,
        TRACK_OUTER_RADIUS,
        TRACK_INNER_RADIUS,
        TRACK_TURNS,
        TRACK_SEGMENTS,
    )?;

    let mut state = ChainState::new(tuning, stages, args.seed);
    let stage = Difficulty::detect(&args.stage);
    if let Err(err) = state.set_stage(stage) {
        log::warn!("{}, staying on stage {}", err, state.current_stage());
    }
    state.refresh_poses(&path);
    log::info!("Session started with seed: {}", args.seed);

    let mut shooter = Shooter::new(args.seed, args.fire_interval);
    let mut summary = Summary::default();
    let max_ticks = (args.max_seconds / SIM_DT).ceil() as u64;

    while state.time_ticks < max_ticks && state.outcome().is_none() {
        let input = shooter.aim(&state, SIM_DT);
        summary.shots += input.hits.len();
        for event in tick(&mut state, &path, &input, SIM_DT) {
            summary.record(&event);
        }
    }

    summary.print(&state);
    Ok(())
}

/// Scripted shooter: completes a pair when it sees one, otherwise builds one
struct Shooter {
    rng: Pcg32,
    interval: f32,
    cooldown: f32,
}

impl Shooter {
    fn new(seed: u64, interval: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
            interval: interval.max(SIM_DT),
            cooldown: interval,
        }
    }

    fn aim(&mut self, state: &ChainState, dt: f32) -> TickInput {
        self.cooldown -= dt;
        if self.cooldown > 0.0 || state.remaining() == 0 {
            return TickInput::default();
        }
        self.cooldown += self.interval;

        let tokens: Vec<_> = state.tokens().collect();
        let pair = tokens
            .windows(2)
            .find(|w| w[0].color == w[1].color)
            .map(|w| (w[0].index, w[0].color));

        let (target_index, color) = match pair {
            Some(pair) if self.rng.random_bool(0.7) => pair,
            _ => {
                let index = self.rng.random_range(0..tokens.len());
                let color = if self.rng.random_bool(0.5) {
                    tokens[index].color
                } else {
                    Color::ALL[self.rng.random_range(0..Color::ALL.len())]
                };
                (index, color)
            }
        };

        TickInput {
            hits: vec![ProjectileHit {
                target_index,
                color,
            }],
        }
    }
}

#[derive(Debug, Default)]
struct Summary {
    shots: usize,
    inserted: usize,
    matches: usize,
    cleared: usize,
    gaps_closed: usize,
    gaps_timed_out: usize,
    warnings: usize,
}

impl Summary {
    fn record(&mut self, event: &ChainEvent) {
        match event {
            ChainEvent::Inserted { .. } => self.inserted += 1,
            ChainEvent::MatchCleared { count, .. } => {
                self.matches += 1;
                self.cleared += count;
            }
            ChainEvent::GapClosed { timed_out: false } => self.gaps_closed += 1,
            ChainEvent::GapClosed { timed_out: true } => self.gaps_timed_out += 1,
            ChainEvent::Warning(_) => self.warnings += 1,
            ChainEvent::GameOver | ChainEvent::Win => {}
        }
    }

    fn print(&self, state: &ChainState) {
        let stage = state
            .stage(state.current_stage())
            .map_or("<none>", |s| s.name.as_str());
        let result = match state.outcome() {
            Some(Outcome::Win) => "win",
            Some(Outcome::GameOver) => "game over",
            None => "time limit",
        };

        println!("Stage:          {}", stage);
        println!("Result:         {}", result);
        println!("Time:           {:.1}s ({} ticks)", state.clock(), state.time_ticks);
        println!("Shots:          {} ({} inserted)", self.shots, self.inserted);
        println!("Matches:        {} ({} tokens cleared)", self.matches, self.cleared);
        println!("Gaps closed:    {} ({} timed out)", self.gaps_closed + self.gaps_timed_out, self.gaps_timed_out);
        println!("Remaining:      {}", state.remaining());
        println!("Furthest:       {:.0}%", state.furthest_progress() * 100.0);
        if self.warnings > 0 {
            println!("Warnings:       {}", self.warnings);
        }
    }
}
