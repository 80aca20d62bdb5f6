//! Deterministic chain simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by chain index)
//! - No rendering or platform dependencies

pub mod cascade;
pub mod gap;
pub mod matching;
pub mod movement;
pub mod outcome;
pub mod sequence;
pub mod state;
pub mod tick;
pub mod token;

pub use cascade::CascadeQueue;
pub use gap::{GapAnimator, GapState, GapTransition};
pub use matching::{MatchScan, find_maximal_run, repair_pattern, scan_all_matches};
pub use outcome::{Outcome, OutcomeTracker};
pub use sequence::Sequence;
pub use state::{ChainEvent, ChainState, ProjectileHit, RngState, SpeedRamp};
pub use tick::{TickInput, tick};
pub use token::{Color, Token, TokenId, TokenView};
