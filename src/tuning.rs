//! Data-driven chain balance
//!
//! Every policy constant the chain engine uses lives here so stages can be
//! rebalanced from a JSON file without touching the simulation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Chain movement, gap animation and match pacing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTuning {
    // === Movement ===
    /// Base advance speed along the path (distance units per second)
    pub speed: f32,
    /// Steady-state distance between adjacent tokens
    pub rest_spacing: f32,

    // === Gap animation ===
    /// Speed multiplier for the side nearer the goal while a gap closes (0 = stopped)
    pub front_slow_factor: f32,
    /// Speed multiplier for the trailing side while a gap closes
    pub catch_up_factor: f32,
    /// Extra distance beyond rest spacing before a gap is animated
    pub gap_threshold: f32,
    /// Hard bound on a single gap animation (seconds)
    pub gap_timeout: f32,
    /// Fraction of the remaining excess removed per second
    pub closing_rate: f32,
    /// A gap within this much of rest spacing snaps shut
    pub snap_epsilon: f32,

    // === Matching ===
    /// Minimum run length that clears
    pub min_run_length: usize,
    /// Seconds between two released cascade matches
    pub match_delay: f32,
    /// Safety valve for the match enumeration loop
    pub max_scan_iterations: u32,
    /// Safety valve for initial pattern repair
    pub max_repair_attempts: u32,

    // === Outcome ===
    pub game_over_enabled: bool,
    /// Progress (0-1) at which a token ends the run
    pub game_over_threshold: f32,
}

impl Default for ChainTuning {
    fn default() -> Self {
        Self {
            speed: 2.0,
            rest_spacing: 0.3,

            front_slow_factor: 0.0,
            catch_up_factor: 6.0,
            gap_threshold: 0.5,
            gap_timeout: 1.5,
            closing_rate: 8.0,
            snap_epsilon: 0.01,

            min_run_length: 3,
            match_delay: 0.5,
            max_scan_iterations: 50,
            max_repair_attempts: 20,

            game_over_enabled: true,
            game_over_threshold: 0.95,
        }
    }
}

impl ChainTuning {
    /// Parse tuning from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file on disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded chain tuning from {}", path.display());
        Ok(tuning)
    }

    /// Serialize to pretty JSON (for writing a starter file)
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("speed", self.speed),
            ("rest_spacing", self.rest_spacing),
            ("gap_timeout", self.gap_timeout),
            ("closing_rate", self.closing_rate),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("front_slow_factor", self.front_slow_factor),
            ("catch_up_factor", self.catch_up_factor),
            ("gap_threshold", self.gap_threshold),
            ("snap_epsilon", self.snap_epsilon),
            ("match_delay", self.match_delay),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must not be negative, got {value}")));
            }
        }

        if self.min_run_length < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_run_length must be at least 2, got {}",
                self.min_run_length
            )));
        }
        if !(0.0..=1.0).contains(&self.game_over_threshold) {
            return Err(ConfigError::Invalid(format!(
                "game_over_threshold must be within [0, 1], got {}",
                self.game_over_threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ChainTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = ChainTuning::from_json(r#"{ "speed": 3.5, "match_delay": 0.25 }"#).unwrap();
        assert_eq!(tuning.speed, 3.5);
        assert_eq!(tuning.match_delay, 0.25);
        assert_eq!(tuning.rest_spacing, 0.3);
        assert_eq!(tuning.max_scan_iterations, 50);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ChainTuning::from_json(r#"{ "rest_spacing": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ChainTuning::from_json(r#"{ "min_run_length": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ChainTuning::from_json(r#"{ "game_over_threshold": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = ChainTuning::from_json("{ speed: ").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ChainTuning::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = ChainTuning {
            catch_up_factor: 4.0,
            ..Default::default()
        };
        let back = ChainTuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(back, tuning);
    }
}
