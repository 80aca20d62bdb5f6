//! Path geometry consumed by the chain engine
//!
//! The engine only needs two things from a track: its total length and a
//! pose (position + forward direction) at a normalized progress. Anything
//! implementing `PathProvider` can drive a chain.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::polar_to_cartesian;

/// Position and forward direction at a point on the path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub position: Vec2,
    /// Unit tangent pointing toward the goal
    pub direction: Vec2,
}

/// A track the chain follows. Must be pure and deterministic for a stage.
pub trait PathProvider {
    /// Total arc length
    fn length(&self) -> f32;

    /// Pose at `progress` in [0, 1] (values outside are clamped)
    fn evaluate(&self, progress: f32) -> PathSample;
}

/// Arc-length parameterised polyline.
///
/// Serialized as its point list; deserializing goes through `new`, so a
/// loaded path is always valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>")]
pub struct PolylinePath {
    points: Vec<Vec2>,
    /// Cumulative length at each point (`cumulative[0] == 0`)
    cumulative: Vec<f32>,
}

impl PolylinePath {
    pub fn new(points: Vec<Vec2>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::Invalid(format!(
                "path needs at least 2 points, got {}",
                points.len()
            )));
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }

        if total <= f32::EPSILON {
            return Err(ConfigError::Invalid("path has zero length".to_string()));
        }

        Ok(Self { points, cumulative })
    }

    /// Inward Archimedean spiral, the classic marble-shooter track.
    ///
    /// Starts at `outer_radius` and winds `turns` times toward `inner_radius`,
    /// where the goal sits.
    pub fn spiral(
        center: Vec2,
        outer_radius: f32,
        inner_radius: f32,
        turns: f32,
        segments: usize,
    ) -> Result<Self, ConfigError> {
        let segments = segments.max(2);
        let points = (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                let r = outer_radius + (inner_radius - outer_radius) * t;
                let theta = t * turns * std::f32::consts::TAU;
                center + polar_to_cartesian(r, theta)
            })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }
}

impl TryFrom<Vec<Vec2>> for PolylinePath {
    type Error = ConfigError;

    fn try_from(points: Vec<Vec2>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PolylinePath> for Vec<Vec2> {
    fn from(path: PolylinePath) -> Self {
        path.points
    }
}

impl PathProvider for PolylinePath {
    fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn evaluate(&self, progress: f32) -> PathSample {
        let target = progress.clamp(0.0, 1.0) * self.length();

        // First point whose cumulative length reaches the target
        let upper = self
            .cumulative
            .partition_point(|&d| d < target)
            .clamp(1, self.points.len() - 1);
        let lower = upper - 1;

        let a = self.points[lower];
        let b = self.points[upper];
        let seg_len = self.cumulative[upper] - self.cumulative[lower];
        let t = if seg_len > 0.0 {
            (target - self.cumulative[lower]) / seg_len
        } else {
            0.0
        };

        PathSample {
            position: a.lerp(b, t),
            direction: (b - a).normalize_or_zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(len: f32) -> PolylinePath {
        PolylinePath::new(vec![Vec2::ZERO, Vec2::new(len, 0.0)]).unwrap()
    }

    #[test]
    fn test_straight_length_and_pose() {
        let path = straight(10.0);
        assert!((path.length() - 10.0).abs() < 1e-5);

        let mid = path.evaluate(0.5);
        assert!((mid.position - Vec2::new(5.0, 0.0)).length() < 1e-5);
        assert!((mid.direction - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_progress_is_clamped() {
        let path = straight(4.0);
        assert_eq!(path.evaluate(-1.0).position, Vec2::ZERO);
        assert!((path.evaluate(2.0).position - Vec2::new(4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_corner_direction_changes() {
        let path =
            PolylinePath::new(vec![Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0)]).unwrap();
        assert!((path.length() - 4.0).abs() < 1e-5);

        let before = path.evaluate(0.25);
        assert!((before.direction - Vec2::X).length() < 1e-5);

        let after = path.evaluate(0.75);
        assert!((after.position - Vec2::new(2.0, 1.0)).length() < 1e-5);
        assert!((after.direction - Vec2::Y).length() < 1e-5);
    }

    #[test]
    fn test_rejects_degenerate_paths() {
        assert!(PolylinePath::new(vec![Vec2::ONE]).is_err());
        assert!(PolylinePath::new(vec![Vec2::ONE, Vec2::ONE]).is_err());
    }

    #[test]
    fn test_json_goes_through_validation() {
        let path: PolylinePath = serde_json::from_str("[[0.0, 0.0], [3.0, 4.0]]").unwrap();
        assert!((path.length() - 5.0).abs() < 1e-5);
        assert_eq!(serde_json::to_string(&path).unwrap(), "[[0.0,0.0],[3.0,4.0]]");

        assert!(serde_json::from_str::<PolylinePath>("[[0.0, 0.0]]").is_err());
        assert!(serde_json::from_str::<PolylinePath>("[]").is_err());
        assert!(
            serde_json::from_str::<PolylinePath>(r#"{"points":[[0.0,0.0]],"cumulative":[0.0]}"#)
                .is_err()
        );
    }

    #[test]
    fn test_spiral_winds_inward() {
        let path = PolylinePath::spiral(Vec2::ZERO, 10.0, 2.0, 2.0, 256).unwrap();
        let start = path.evaluate(0.0).position.length();
        let end = path.evaluate(1.0).position.length();
        assert!((start - 10.0).abs() < 1e-3);
        assert!((end - 2.0).abs() < 1e-3);
        // Two turns of a spiral averaging radius 6 is roughly 2 * TAU * 6
        assert!(path.length() > 60.0 && path.length() < 90.0);
    }
}
