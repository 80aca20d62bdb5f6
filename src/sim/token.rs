//! Chain tokens and the color palette

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Fixed token palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Pink,
    Purple,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Green,
        Color::Blue,
        Color::Pink,
        Color::Purple,
        Color::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Pink => "Pink",
            Color::Purple => "Purple",
            Color::Yellow => "Yellow",
        }
    }

    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable token identity. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

/// One colored element of the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub color: Color,
    /// Distance travelled along the path
    pub distance: f32,
    /// Marked by an out-of-band collaborator; removed on the next prune
    #[serde(default)]
    pub destroyed: bool,
    /// Last evaluated pose on the path (for rendering)
    pub position: Vec2,
    pub direction: Vec2,
    /// Last evaluated normalized progress
    #[serde(default)]
    pub progress: f32,
}

impl Token {
    pub fn new(id: TokenId, color: Color, distance: f32) -> Self {
        Self {
            id,
            color,
            distance,
            destroyed: false,
            position: Vec2::ZERO,
            direction: Vec2::X,
            progress: 0.0,
        }
    }

    /// Snapshot for renderers at the given (current) index
    pub fn view(&self, index: usize) -> TokenView {
        TokenView {
            index,
            id: self.id,
            color: self.color,
            distance: self.distance,
            progress: self.progress,
            position: self.position,
            direction: self.direction,
        }
    }

    /// Color for matching purposes (destroyed tokens never match)
    #[inline]
    pub fn match_color(&self) -> Option<Color> {
        if self.destroyed { None } else { Some(self.color) }
    }
}

/// Read-only view of a token handed to renderers and UI.
///
/// `index` is only valid until the next structural change of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenView {
    pub index: usize,
    pub id: TokenId,
    pub color: Color,
    pub distance: f32,
    /// Normalized progress along the path, clamped to [0, 1]
    pub progress: f32,
    pub position: Vec2,
    pub direction: Vec2,
}
