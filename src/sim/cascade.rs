//! Paced match release queue
//!
//! Matches found after an insertion are not all resolved in one frame.
//! They are queued and released one at a time with a minimum delay so
//! cascades read as a sequence of pops.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadeQueue {
    /// Pending run start indices (FIFO)
    pending: VecDeque<usize>,
    /// Engine clock at the last release (seconds)
    last_release: f32,
}

impl CascadeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.iter().copied()
    }

    /// Discard stale entries and queue a fresh scan
    pub fn replace(&mut self, starts: impl IntoIterator<Item = usize>) {
        self.pending.clear();
        self.pending.extend(starts);
    }

    /// Release the next entry if at least `delay` seconds passed since the last one
    pub fn release(&mut self, now: f32, delay: f32) -> Option<usize> {
        if self.pending.is_empty() || now - self.last_release < delay {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.last_release = now;
        Some(next)
    }

    /// Drop everything and restart the pacing clock
    pub fn clear(&mut self) {
        self.pending.clear();
        self.last_release = 0.0;
    }
}
