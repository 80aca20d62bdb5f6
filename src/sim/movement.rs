//! Per-tick chain advance along the path

use super::gap::GapAnimator;
use super::sequence::Sequence;
use crate::path::PathProvider;
use crate::tuning::ChainTuning;

/// Normalized progress of a distance, clamped to [0, 1]
#[inline]
pub fn progress_of(distance: f32, path_length: f32) -> f32 {
    if path_length > 0.0 {
        (distance / path_length).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// A token that reached the stop threshold during `advance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdCrossing {
    pub index: usize,
    pub progress: f32,
}

/// Move every token by its gap-aware speed and refresh its pose.
///
/// Tokens are processed in index order. When `stop_at` is set and a token's
/// progress reaches it, the loop stops immediately and the remaining tokens
/// keep their previous distance for this tick.
pub fn advance<P: PathProvider + ?Sized>(
    seq: &mut Sequence,
    gap: &GapAnimator,
    tuning: &ChainTuning,
    speed: f32,
    dt: f32,
    path: &P,
    stop_at: Option<f32>,
) -> Option<ThresholdCrossing> {
    let path_length = path.length();
    let catch_up_limit = catch_up_limit(seq, gap, tuning, speed, dt);

    for (index, token) in seq.tokens_mut().iter_mut().enumerate() {
        let mut step = speed * gap.speed_factor(index, tuning) * dt;
        if let Some((trailing, limit)) = catch_up_limit {
            if index <= trailing {
                step = step.min(limit);
            }
        }
        token.distance += step;

        let progress = progress_of(token.distance, path_length);
        let sample = path.evaluate(progress);
        token.position = sample.position;
        token.direction = sample.direction;
        token.progress = progress;

        if let Some(threshold) = stop_at {
            if progress >= threshold {
                return Some(ThresholdCrossing { index, progress });
            }
        }
    }
    None
}

/// The trailing side may close the gap down to rest spacing but never past
/// it, otherwise the chain would overlap before the animator snaps.
fn catch_up_limit(
    seq: &Sequence,
    gap: &GapAnimator,
    tuning: &ChainTuning,
    speed: f32,
    dt: f32,
) -> Option<(usize, f32)> {
    let (trailing, leading) = gap.anchors()?;
    let back = seq.distance(trailing)?;
    let front = seq.distance(leading)?;
    let front_step = speed * tuning.front_slow_factor * dt;
    let limit = (front + front_step - back - tuning.rest_spacing).max(0.0);
    Some((trailing, limit))
}

/// Re-evaluate poses without moving (after load or insertion)
pub fn refresh_poses<P: PathProvider + ?Sized>(seq: &mut Sequence, path: &P) {
    let path_length = path.length();
    for token in seq.tokens_mut() {
        let progress = progress_of(token.distance, path_length);
        let sample = path.evaluate(progress);
        token.position = sample.position;
        token.direction = sample.direction;
        token.progress = progress;
    }
}
