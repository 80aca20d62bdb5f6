//! One-shot win / game-over tracking

use serde::{Deserialize, Serialize};

/// Terminal state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    GameOver,
    Win,
}

/// Both flags flip false -> true at most once per session and never together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutcomeTracker {
    game_over: bool,
    win: bool,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_win(&self) -> bool {
        self.win
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.game_over {
            Some(Outcome::GameOver)
        } else if self.win {
            Some(Outcome::Win)
        } else {
            None
        }
    }

    /// Returns true only on the call that actually fired
    pub fn fire_game_over(&mut self) -> bool {
        if self.game_over || self.win {
            return false;
        }
        self.game_over = true;
        true
    }

    /// Fires the win flag when the chain is empty. Returns true only on the call that fired.
    pub fn check_win(&mut self, remaining: usize) -> bool {
        if remaining != 0 || self.game_over || self.win {
            return false;
        }
        self.win = true;
        true
    }

    pub fn reset(&mut self) {
        self.game_over = false;
        self.win = false;
    }
}
