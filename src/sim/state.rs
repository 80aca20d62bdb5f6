//! Chain session state
//!
//! Everything one session owns: the token sequence, the gap animator, the
//! cascade queue, the outcome flags and the clock. Nothing here is global;
//! drivers hold a `ChainState` and pass the path in on every tick.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::cascade::CascadeQueue;
use super::gap::{GapAnimator, GapState};
use super::matching::{find_maximal_run, repair_pattern, scan_all_matches};
use super::movement::{ThresholdCrossing, refresh_poses};
use super::outcome::{Outcome, OutcomeTracker};
use super::sequence::Sequence;
use super::token::{Color, TokenId, TokenView};
use crate::error::ChainError;
use crate::path::PathProvider;
use crate::stages::{StagePattern, StageSet};
use crate::tuning::ChainTuning;

/// A projectile struck the token at `target_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileHit {
    pub target_index: usize,
    pub color: Color,
}

/// Notifications for presentation collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    /// A hit inserted a token
    Inserted { id: TokenId, index: usize },
    /// A run was removed; `start` is its first index before removal
    MatchCleared {
        color: Color,
        count: usize,
        start: usize,
    },
    /// A gap animation finished
    GapClosed { timed_out: bool },
    GameOver,
    Win,
    /// Non-fatal anomaly; the engine skipped the offending operation
    Warning(ChainError),
}

/// Linear speed change driven by the tick clock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRamp {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
}

impl SpeedRamp {
    /// Advance the ramp. Returns the current speed and whether it finished.
    pub fn step(&mut self, dt: f32) -> (f32, bool) {
        self.elapsed += dt;
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).min(1.0)
        } else {
            1.0
        };
        (self.from + (self.to - self.from) * t, t >= 1.0)
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Generator for the next consumer. Every call gets its own stream.
    pub fn next_rng(&mut self) -> Pcg32 {
        let rng = Pcg32::new(self.seed, self.stream);
        self.stream += 1;
        rng
    }
}

/// Complete chain session (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub tuning: ChainTuning,
    pub(crate) stages: StageSet,
    pub(crate) current_stage: usize,
    pub(crate) sequence: Sequence,
    pub(crate) gap: GapAnimator,
    pub(crate) cascade: CascadeQueue,
    pub(crate) outcome: OutcomeTracker,
    /// Current base speed (may differ from tuning while ramping)
    pub(crate) speed: f32,
    pub(crate) speed_ramp: Option<SpeedRamp>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Seconds since the stage was (re)loaded
    pub(crate) clock: f32,
    /// Events not yet handed to the driver
    #[serde(skip)]
    pub(crate) events: Vec<ChainEvent>,
}

impl ChainState {
    /// Create a session and load the first stage
    pub fn new(tuning: ChainTuning, stages: StageSet, seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng_state: RngState::new(seed),
            speed: tuning.speed,
            tuning,
            stages,
            current_stage: 0,
            sequence: Sequence::new(),
            gap: GapAnimator::new(),
            cascade: CascadeQueue::new(),
            outcome: OutcomeTracker::new(),
            speed_ramp: None,
            time_ticks: 0,
            clock: 0.0,
            events: Vec::new(),
        };
        state.load_stage();
        state
    }

    /// Default tuning and the built-in stages
    pub fn with_defaults(seed: u64) -> Self {
        Self::new(ChainTuning::default(), StageSet::default(), seed)
    }

    /// Rebuild the chain from the current stage's pattern
    pub fn load_stage(&mut self) {
        self.sequence.clear();
        self.gap.rearm();
        self.cascade.clear();

        if self.stages.is_empty() {
            log::warn!("No stages loaded, starting with an empty chain");
            return;
        }

        let clamped = self.stages.clamp_index(self.current_stage);
        if clamped != self.current_stage {
            log::warn!(
                "Stage {} not found, using stage {}",
                self.current_stage,
                clamped
            );
            self.current_stage = clamped;
        }

        let Some(stage) = self.stages.get(self.current_stage) else {
            return;
        };
        let name = stage.name.clone();
        let mut colors = stage.colors.clone();

        let mut rng = self.rng_state.next_rng();
        match repair_pattern(
            &mut colors,
            &Color::ALL,
            self.tuning.min_run_length,
            self.tuning.max_repair_attempts,
            &mut rng,
        ) {
            Ok(0) => {}
            Ok(fixes) => log::info!("Stage '{}': recolored {} token(s) to break starting runs", name, fixes),
            Err(err) => self.warn(err),
        }

        for (i, color) in colors.into_iter().enumerate() {
            self.sequence
                .push_back(color, i as f32 * self.tuning.rest_spacing);
        }

        log::info!(
            "Loaded stage {} '{}' with {} tokens",
            self.current_stage,
            name,
            self.sequence.len()
        );
    }

    /// Abort everything in flight and reload the current stage
    pub fn reset(&mut self) {
        self.outcome.reset();
        self.cascade.clear();
        self.gap.rearm();
        self.speed_ramp = None;
        self.clock = 0.0;
        self.load_stage();
        log::info!("Session reset");
    }

    /// Switch to `stage` and start it fresh
    pub fn set_stage(&mut self, stage: usize) -> Result<(), ChainError> {
        if stage >= self.stages.len() {
            let err = ChainError::UnknownStage {
                stage,
                count: self.stages.len(),
            };
            log::warn!("{}", err);
            return Err(err);
        }
        self.current_stage = stage;
        self.reset();
        Ok(())
    }

    /// Advance to the next stage, wrapping to the first after the last
    pub fn next_stage(&mut self) {
        let next = self.stages.next_index(self.current_stage);
        if next == 0 {
            log::info!("All stages completed, wrapping to stage 0");
        }
        self.current_stage = next;
        self.reset();
    }

    pub fn current_stage(&self) -> usize {
        self.current_stage
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, index: usize) -> Option<&StagePattern> {
        self.stages.get(index)
    }

    /// Insert the projectile's token before the struck token and queue
    /// every match the chain now contains.
    pub fn apply_hit(&mut self, hit: ProjectileHit) -> Result<TokenId, ChainError> {
        if self.outcome.is_game_over() {
            log::debug!("Ignoring hit at {} after game over", hit.target_index);
            return Err(ChainError::SessionEnded);
        }

        let live = self
            .sequence
            .get(hit.target_index)
            .is_some_and(|t| !t.destroyed);
        if !live {
            let err = ChainError::IndexOutOfRange {
                index: hit.target_index,
                len: self.sequence.len(),
            };
            self.warn(err.clone());
            return Err(err);
        }

        let (index, id) =
            self.sequence
                .insert_before(hit.target_index, hit.color, self.tuning.rest_spacing)?;
        self.gap.rearm();
        log::debug!("Inserted {} token {:?} at index {}", hit.color, id, index);
        self.events.push(ChainEvent::Inserted { id, index });

        self.queue_matches();
        Ok(id)
    }

    /// Replace the cascade queue with a fresh scan of the live chain
    pub(crate) fn queue_matches(&mut self) {
        let scan = scan_all_matches(
            &self.sequence.match_slots(),
            self.tuning.min_run_length,
            self.tuning.max_scan_iterations,
        );
        if scan.limit_reached {
            self.warn(ChainError::ScanIterationLimitReached {
                limit: self.tuning.max_scan_iterations,
                found: scan.starts.len(),
            });
        }
        if !scan.starts.is_empty() {
            log::debug!("Queued {} match(es) at {:?}", scan.starts.len(), scan.starts);
        }
        self.cascade.replace(scan.starts);
    }

    /// Resolve the run at `index` as it looks now.
    ///
    /// The index was recorded when the match was queued, so the run is
    /// re-derived from the live chain. A missing token or a run that no
    /// longer qualifies is skipped. Returns how many tokens were removed.
    pub fn resolve_at(&mut self, index: usize) -> Option<usize> {
        let slots = self.sequence.match_slots();
        let Some((left, right)) = find_maximal_run(&slots, index) else {
            log::debug!("Queued match at {} no longer exists, skipping", index);
            return None;
        };

        let count = right - left + 1;
        if count < self.tuning.min_run_length {
            log::debug!("Run at {} shrank to {}, skipping", index, count);
            return None;
        }

        let color = self.sequence.get(left)?.color;
        if let Err(err) = self.sequence.remove_range(left, count) {
            self.warn(err);
            return None;
        }
        self.gap.rearm();

        log::debug!("Cleared {} {} token(s) at {}..={}", count, color, left, right);
        self.events.push(ChainEvent::MatchCleared {
            color,
            count,
            start: left,
        });

        // Closing the hole can join new neighbors
        self.queue_matches();
        self.check_win();
        Some(count)
    }

    /// Drop tokens destroyed out of band, then check for a win
    pub fn prune(&mut self) -> usize {
        let removed = self.sequence.prune();
        if removed > 0 {
            self.gap.rearm();
            log::debug!("Pruned {} destroyed token(s)", removed);
        }
        self.check_win();
        removed
    }

    /// Mark a token destroyed; it is removed on the next prune
    pub fn destroy_token(&mut self, id: TokenId) -> bool {
        self.sequence.mark_destroyed(id)
    }

    pub(crate) fn check_win(&mut self) -> bool {
        if self.outcome.check_win(self.sequence.len()) {
            log::info!("Win! Stage {} cleared", self.current_stage);
            self.events.push(ChainEvent::Win);
            true
        } else {
            false
        }
    }

    pub(crate) fn trigger_game_over(&mut self, crossing: ThresholdCrossing) {
        if self.outcome.fire_game_over() {
            log::info!(
                "Game over! Token at index {} reached progress {:.2}",
                crossing.index,
                crossing.progress
            );
            self.events.push(ChainEvent::GameOver);
        }
    }

    pub(crate) fn warn(&mut self, err: ChainError) {
        log::warn!("{}", err);
        self.events.push(ChainEvent::Warning(err));
    }

    // === Speed ===

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Set the base speed immediately (cancels a running ramp)
    pub fn set_speed(&mut self, speed: f32) {
        self.speed_ramp = None;
        self.speed = speed;
        log::info!("Chain speed set to {}", speed);
    }

    /// Change speed linearly over `duration` seconds of simulation time
    pub fn ramp_speed(&mut self, target: f32, duration: f32) {
        if duration <= 0.0 {
            self.set_speed(target);
            return;
        }
        self.speed_ramp = Some(SpeedRamp {
            from: self.speed,
            to: target,
            duration,
            elapsed: 0.0,
        });
    }

    pub(crate) fn step_speed_ramp(&mut self, dt: f32) {
        let Some(mut ramp) = self.speed_ramp else {
            return;
        };
        let (speed, done) = ramp.step(dt);
        self.speed = speed;
        if done {
            log::info!("Chain speed changed to {}", speed);
            self.speed_ramp = None;
        } else {
            self.speed_ramp = Some(ramp);
        }
    }

    // === Queries ===

    pub fn remaining(&self) -> usize {
        self.sequence.len()
    }

    /// Progress of the token nearest the goal (1.0 once the chain is empty)
    pub fn furthest_progress(&self) -> f32 {
        self.sequence
            .tokens()
            .iter()
            .map(|t| t.progress)
            .reduce(f32::max)
            .unwrap_or(1.0)
    }

    pub fn token_at(&self, index: usize) -> Option<TokenView> {
        self.sequence.get(index).map(|t| t.view(index))
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenView> + '_ {
        self.sequence
            .tokens()
            .iter()
            .enumerate()
            .map(|(i, t)| t.view(i))
    }

    pub fn index_of(&self, id: TokenId) -> Option<usize> {
        self.sequence.index_of(id)
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_game_over()
    }

    pub fn is_win(&self) -> bool {
        self.outcome.is_win()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.outcome()
    }

    pub fn gap_state(&self) -> GapState {
        self.gap.state()
    }

    pub fn pending_matches(&self) -> usize {
        self.cascade.len()
    }

    /// Seconds since the stage was (re)loaded
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Re-evaluate every token's pose without moving the chain
    pub fn refresh_poses<P: PathProvider + ?Sized>(&mut self, path: &P) {
        refresh_poses(&mut self.sequence, path);
    }

    /// Hand pending events to the caller
    pub fn take_events(&mut self) -> Vec<ChainEvent> {
        std::mem::take(&mut self.events)
    }
}
