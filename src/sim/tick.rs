//! Fixed timestep simulation tick
//!
//! One call advances the chain deterministically: hits first, then pruning,
//! one paced match release, the gap animator and finally movement with the
//! game-over threshold check.

use super::gap::GapTransition;
use super::movement;
use super::state::{ChainEvent, ChainState, ProjectileHit};
use crate::path::PathProvider;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Projectile hits reported by the shooter since the last tick
    pub hits: Vec<ProjectileHit>,
}

/// Advance the chain by one fixed timestep and return the events it produced
pub fn tick<P: PathProvider + ?Sized>(
    state: &mut ChainState,
    path: &P,
    input: &TickInput,
    dt: f32,
) -> Vec<ChainEvent> {
    // Frozen once the run is lost, until reset
    if state.is_game_over() {
        if !input.hits.is_empty() {
            log::debug!("Dropping {} hit(s) after game over", input.hits.len());
        }
        return state.take_events();
    }

    for hit in &input.hits {
        // Rejected hits are already reported as warnings
        let _ = state.apply_hit(*hit);
    }

    state.time_ticks += 1;
    state.clock += dt;
    state.step_speed_ramp(dt);

    state.prune();

    // At most one queued match per tick, paced by the match delay
    if let Some(index) = state
        .cascade
        .release(state.clock, state.tuning.match_delay)
    {
        state.resolve_at(index);
    }

    match state
        .gap
        .update(&mut state.sequence, &state.tuning, state.clock, dt)
    {
        GapTransition::Started { trailing, gap } => {
            log::debug!("Closing gap of {:.2} after index {}", gap, trailing);
        }
        GapTransition::Closed => {
            state.events.push(ChainEvent::GapClosed { timed_out: false });
        }
        GapTransition::TimedOut => {
            log::debug!("Gap animation timed out, snapped shut");
            state.events.push(ChainEvent::GapClosed { timed_out: true });
        }
        GapTransition::None | GapTransition::Closing { .. } => {}
    }

    let stop_at = state
        .tuning
        .game_over_enabled
        .then_some(state.tuning.game_over_threshold);
    if let Some(crossing) = movement::advance(
        &mut state.sequence,
        &state.gap,
        &state.tuning,
        state.speed,
        dt,
        path,
        stop_at,
    ) {
        state.trigger_game_over(crossing);
    }

    state.take_events()
}
