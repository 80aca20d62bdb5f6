//! Error taxonomy
//!
//! `ChainError` covers anomalies the engine survives: every one of them
//! degrades to a skipped operation plus a diagnostic. `ConfigError` covers
//! loading tuning, stages and paths before a session starts.

use thiserror::Error;

/// Recoverable chain anomalies, reported through `ChainEvent::Warning`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("index {index} out of range for chain of {len} tokens")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("pattern repair gave up after {attempts} attempts with {residual} run(s) remaining")]
    PatternRepairExhausted { attempts: u32, residual: usize },

    #[error("match scan stopped at {limit} iterations after queueing {found} match(es)")]
    ScanIterationLimitReached { limit: u32, found: usize },

    #[error("stage {stage} does not exist ({count} stages loaded)")]
    UnknownStage { stage: usize, count: usize },

    #[error("session already ended, hit ignored")]
    SessionEnded,
}

/// Failures while loading tuning, stage catalogs or path geometry
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
