//! Stage catalog
//!
//! A stage is a literal color pattern for the initial chain plus some
//! metadata for menus. Catalogs can be loaded from JSON; the built-in set has
//! an easy, a medium and a hard stage.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::Color;

/// One stage's initial chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagePattern {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// 1 = easy, 2 = medium, 3 = hard
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    /// Chain colors, index 0 first onto the path
    pub colors: Vec<Color>,
}

fn default_difficulty() -> u8 {
    1
}

/// Difficulty tiers, each mapped to a stage of the built-in catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Match a free-form label such as a scene name ("Game_Hard")
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.to_lowercase();
        if label.contains("easy") {
            Some(Difficulty::Easy)
        } else if label.contains("medium") {
            Some(Difficulty::Medium)
        } else if label.contains("hard") {
            Some(Difficulty::Hard)
        } else {
            None
        }
    }

    pub fn stage_index(&self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }

    /// Stage index for a label, falling back to the first stage
    pub fn detect(label: &str) -> usize {
        match Self::from_label(label) {
            Some(difficulty) => {
                log::info!("Detected {:?} stage from '{}'", difficulty, label);
                difficulty.stage_index()
            }
            None => {
                log::warn!("Could not detect a stage from '{}', using stage 0", label);
                0
            }
        }
    }
}

/// Ordered list of stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSet {
    pub stages: Vec<StagePattern>,
}

impl Default for StageSet {
    fn default() -> Self {
        use Color::*;

        let cycle = [Red, Blue, Green, Yellow, Pink, Purple];
        let easy: Vec<Color> = cycle.iter().copied().cycle().take(20).collect();

        // Pairs everywhere: one well-placed shot completes a run
        let paired = [
            Red, Red, Blue, Green, Green, Yellow, Pink, Pink, Purple, Red, Blue, Blue, Green,
            Yellow, Yellow, Pink, Purple, Purple, Red, Blue, Green, Yellow, Pink, Purple, Red,
        ];
        let medium = paired.to_vec();
        let mut hard = paired.to_vec();
        hard.extend([Blue, Green, Yellow, Pink, Purple]);

        Self {
            stages: vec![
                StagePattern {
                    name: "Easy - Color Introduction".to_string(),
                    description: "Learn all the colors with a simple repeating chain.".to_string(),
                    difficulty: 1,
                    colors: easy,
                },
                StagePattern {
                    name: "Medium - Strategic Matches".to_string(),
                    description: "Almost matches everywhere. One shot can set off a run."
                        .to_string(),
                    difficulty: 2,
                    colors: medium,
                },
                StagePattern {
                    name: "Hard - Master Challenge".to_string(),
                    description: "A long chain with many match opportunities.".to_string(),
                    difficulty: 3,
                    colors: hard,
                },
            ],
        }
    }
}

impl StageSet {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let set: Self = serde_json::from_str(json)?;
        if set.stages.is_empty() {
            return Err(ConfigError::Invalid("stage set has no stages".to_string()));
        }
        Ok(set)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let set = Self::from_json(&json)?;
        log::info!("Loaded {} stages from {}", set.stages.len(), path.display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StagePattern> {
        self.stages.get(index)
    }

    /// Nearest valid stage index (the catalog is never empty once loaded)
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.stages.len().saturating_sub(1))
    }

    /// Stage after `index`, wrapping back to the first
    pub fn next_index(&self, index: usize) -> usize {
        if index + 1 >= self.stages.len() { 0 } else { index + 1 }
    }
}
