//! Gap closing animation
//!
//! When a match removes tokens the chain is left with a hole. Rather than
//! snapping shut, the largest oversized gap is animated closed: the side
//! nearer the goal waits, the trailing side hurries, and the leading side is
//! pulled back by a geometrically shrinking amount each tick. A timeout
//! force-snaps the gap so the machine can never get stuck.

use serde::{Deserialize, Serialize};

use super::sequence::Sequence;
use crate::tuning::ChainTuning;

/// Gap animator state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum GapState {
    #[default]
    Idle,
    Animating {
        /// Lower index of the gap pair; this side catches up
        trailing: usize,
        /// `trailing + 1`; this side (and everything beyond it) waits
        leading: usize,
        /// Engine clock when the animation started (seconds)
        started_at: f32,
        /// Gap size when the animation started
        original_gap: f32,
    },
}

/// What an update did, for logging and events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapTransition {
    None,
    Started { trailing: usize, gap: f32 },
    Closing { gap: f32 },
    Closed,
    TimedOut,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapAnimator {
    state: GapState,
}

impl GapAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GapState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GapState::Animating { .. })
    }

    /// Drop any running animation so the next update rescans for the largest gap.
    /// Called after every structural change to the chain.
    pub fn rearm(&mut self) {
        self.state = GapState::Idle;
    }

    /// Speed multiplier for the token at `index` under the current state
    pub fn speed_factor(&self, index: usize, tuning: &ChainTuning) -> f32 {
        match self.state {
            GapState::Idle => 1.0,
            GapState::Animating {
                trailing, leading, ..
            } => {
                if index >= leading {
                    tuning.front_slow_factor
                } else if index <= trailing {
                    tuning.catch_up_factor
                } else {
                    1.0
                }
            }
        }
    }

    /// Anchor pair of the running animation
    pub fn anchors(&self) -> Option<(usize, usize)> {
        match self.state {
            GapState::Animating {
                trailing, leading, ..
            } => Some((trailing, leading)),
            GapState::Idle => None,
        }
    }

    /// Advance the state machine by one tick
    pub fn update(
        &mut self,
        seq: &mut Sequence,
        tuning: &ChainTuning,
        now: f32,
        dt: f32,
    ) -> GapTransition {
        if seq.len() < 2 {
            self.state = GapState::Idle;
            return GapTransition::None;
        }

        match self.state {
            GapState::Idle => self.try_start(seq, tuning, now),
            GapState::Animating {
                trailing,
                leading,
                started_at,
                ..
            } => {
                let (Some(back), Some(front)) = (seq.distance(trailing), seq.distance(leading))
                else {
                    // Anchors no longer exist; rescan next tick
                    self.state = GapState::Idle;
                    return GapTransition::None;
                };
                let gap = front - back;
                let excess = gap - tuning.rest_spacing;

                if now - started_at >= tuning.gap_timeout {
                    seq.shift_from(leading, -excess);
                    self.state = GapState::Idle;
                    return GapTransition::TimedOut;
                }

                if gap <= tuning.rest_spacing + tuning.snap_epsilon {
                    seq.shift_from(leading, -excess);
                    self.state = GapState::Idle;
                    return GapTransition::Closed;
                }

                // Geometric decay toward rest spacing
                let reduction = (excess * dt * tuning.closing_rate).min(excess);
                seq.shift_from(leading, -reduction);
                GapTransition::Closing {
                    gap: gap - reduction,
                }
            }
        }
    }

    fn try_start(&mut self, seq: &Sequence, tuning: &ChainTuning, now: f32) -> GapTransition {
        let tokens = seq.tokens();
        let mut widest: Option<(usize, f32)> = None;
        for (i, pair) in tokens.windows(2).enumerate() {
            let gap = pair[1].distance - pair[0].distance;
            if widest.is_none_or(|(_, best)| gap > best) {
                widest = Some((i, gap));
            }
        }

        match widest {
            Some((trailing, gap)) if gap > tuning.rest_spacing + tuning.gap_threshold => {
                self.state = GapState::Animating {
                    trailing,
                    leading: trailing + 1,
                    started_at: now,
                    original_gap: gap,
                };
                GapTransition::Started { trailing, gap }
            }
            _ => GapTransition::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::token::Color;
    use proptest::prelude::*;

    fn chain_with_gap(before: usize, gap: f32, after: usize, spacing: f32) -> Sequence {
        let mut seq = Sequence::new();
        let mut d = 0.0;
        for i in 0..before + after {
            if i > 0 {
                d += if i == before { gap } else { spacing };
            }
            seq.push_back(Color::ALL[i % Color::ALL.len()], d);
        }
        seq
    }

    fn gap_at(seq: &Sequence, trailing: usize) -> f32 {
        seq.distance(trailing + 1).unwrap() - seq.distance(trailing).unwrap()
    }

    #[test]
    fn test_small_gaps_stay_idle() {
        let tuning = ChainTuning::default();
        let mut seq = chain_with_gap(3, 0.6, 3, tuning.rest_spacing);
        let mut gap = GapAnimator::new();
        assert_eq!(gap.update(&mut seq, &tuning, 0.0, 0.016), GapTransition::None);
        assert!(!gap.is_active());
    }

    #[test]
    fn test_picks_largest_gap() {
        let tuning = ChainTuning::default();
        let mut seq = Sequence::new();
        for d in [0.0, 0.3, 1.5, 1.8, 4.0, 4.3] {
            seq.push_back(Color::Red, d);
        }
        let mut gap = GapAnimator::new();
        let t = gap.update(&mut seq, &tuning, 0.0, 0.016);
        assert!(matches!(t, GapTransition::Started { trailing: 3, .. }));
        assert_eq!(gap.anchors(), Some((3, 4)));
    }

    #[test]
    fn test_speed_factors_follow_anchor_sides() {
        let tuning = ChainTuning::default();
        let mut seq = chain_with_gap(3, 2.0, 3, tuning.rest_spacing);
        let mut gap = GapAnimator::new();
        gap.update(&mut seq, &tuning, 0.0, 0.016);

        assert_eq!(gap.speed_factor(0, &tuning), tuning.catch_up_factor);
        assert_eq!(gap.speed_factor(2, &tuning), tuning.catch_up_factor);
        assert_eq!(gap.speed_factor(3, &tuning), tuning.front_slow_factor);
        assert_eq!(gap.speed_factor(5, &tuning), tuning.front_slow_factor);

        gap.rearm();
        assert_eq!(gap.speed_factor(5, &tuning), 1.0);
    }

    #[test]
    fn test_closes_to_exact_rest_spacing() {
        let tuning = ChainTuning::default();
        let mut seq = chain_with_gap(2, 2.0, 4, tuning.rest_spacing);
        let mut gap = GapAnimator::new();
        let dt = 1.0 / 60.0;
        let mut now = 0.0;

        gap.update(&mut seq, &tuning, now, dt);
        let mut last = gap_at(&seq, 1);
        let mut outcome = GapTransition::None;
        for _ in 0..200 {
            now += dt;
            outcome = gap.update(&mut seq, &tuning, now, dt);
            if !gap.is_active() {
                break;
            }
            let current = gap_at(&seq, 1);
            assert!(current < last, "gap must shrink every tick");
            last = current;
        }

        assert!(matches!(outcome, GapTransition::Closed | GapTransition::TimedOut));
        assert!((gap_at(&seq, 1) - tuning.rest_spacing).abs() < 1e-4);
        // Spacing beyond the gap is untouched
        assert!((gap_at(&seq, 3) - tuning.rest_spacing).abs() < 1e-4);
        assert!(seq.is_ordered(1e-5));
    }

    #[test]
    fn test_timeout_force_snaps() {
        let tuning = ChainTuning {
            closing_rate: 0.01,
            ..Default::default()
        };
        let mut seq = chain_with_gap(2, 5.0, 2, tuning.rest_spacing);
        let mut gap = GapAnimator::new();
        gap.update(&mut seq, &tuning, 0.0, 0.1);
        assert!(gap.is_active());

        assert_eq!(
            gap.update(&mut seq, &tuning, tuning.gap_timeout, 0.1),
            GapTransition::TimedOut
        );
        assert!(!gap.is_active());
        assert!((gap_at(&seq, 1) - tuning.rest_spacing).abs() < 1e-4);
    }

    #[test]
    fn test_lost_anchor_returns_to_idle() {
        let tuning = ChainTuning::default();
        let mut seq = chain_with_gap(2, 3.0, 2, tuning.rest_spacing);
        let mut gap = GapAnimator::new();
        gap.update(&mut seq, &tuning, 0.0, 0.016);
        seq.remove_range(1, 3).unwrap();
        gap.update(&mut seq, &tuning, 0.016, 0.016);
        assert!(!gap.is_active());
    }

    proptest! {
        #[test]
        fn prop_gap_converges_within_timeout(
            gap_size in 0.81f32..20.0,
            before in 1usize..6,
            after in 1usize..6,
            dt in 0.005f32..0.05,
            rate in 0.5f32..20.0,
        ) {
            let tuning = ChainTuning { closing_rate: rate, ..Default::default() };
            let mut seq = chain_with_gap(before, gap_size, after, tuning.rest_spacing);
            let mut gap = GapAnimator::new();
            let mut now = 0.0;
            gap.update(&mut seq, &tuning, now, dt);
            prop_assert!(gap.is_active());

            let max_ticks = (tuning.gap_timeout / dt).ceil() as usize + 2;
            for _ in 0..max_ticks {
                now += dt;
                gap.update(&mut seq, &tuning, now, dt);
                if !gap.is_active() {
                    break;
                }
            }

            prop_assert!(!gap.is_active());
            prop_assert!((gap_at(&seq, before - 1) - tuning.rest_spacing).abs() < 1e-3);
            prop_assert!(seq.is_ordered(1e-4));
        }
    }
}
