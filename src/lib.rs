//! Yarn Chain - the chain engine of a marble-shooter game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (token sequence, matching, gap animation)
//! - `path`: Track geometry the chain follows
//! - `stages`: Initial chain patterns
//! - `tuning`: Data-driven chain balance
//! - `error`: Recoverable anomalies and config failures

pub mod error;
pub mod path;
pub mod sim;
pub mod stages;
pub mod tuning;

pub use error::{ChainError, ConfigError};
pub use path::{PathProvider, PathSample, PolylinePath};
pub use stages::{Difficulty, StagePattern, StageSet};
pub use tuning::ChainTuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Default track: an inward spiral around the origin
    pub const TRACK_OUTER_RADIUS: f32 = 12.0;
    pub const TRACK_INNER_RADIUS: f32 = 3.0;
    pub const TRACK_TURNS: f32 = 2.5;
    pub const TRACK_SEGMENTS: usize = 256;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_polar_to_cartesian() {
        assert!((polar_to_cartesian(2.0, 0.0) - Vec2::new(2.0, 0.0)).length() < 1e-6);
        assert!((polar_to_cartesian(1.0, PI / 2.0) - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }
}
