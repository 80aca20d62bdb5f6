//! Ordered token storage
//!
//! Index 0 is the token with the smallest distance; the last index is the
//! token nearest the goal. Distances are non-decreasing by index at rest.
//! Tokens are identified by `TokenId`; indices are derived and change on
//! every insert/remove.

use serde::{Deserialize, Serialize};

use super::token::{Color, Token, TokenId};
use crate::error::ChainError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence {
    tokens: Vec<Token>,
    /// Next token ID (survives `clear` so identities are never reused)
    next_id: u32,
}

impl Sequence {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            next_id: 1,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Mutable access to token fields. The slice cannot change the structure.
    pub fn tokens_mut(&mut self) -> &mut [Token] {
        &mut self.tokens
    }

    pub fn distance(&self, index: usize) -> Option<f32> {
        self.tokens.get(index).map(|t| t.distance)
    }

    /// Current index of a token (derived, linear scan)
    pub fn index_of(&self, id: TokenId) -> Option<usize> {
        self.tokens.iter().position(|t| t.id == id)
    }

    /// Per-index match colors; destroyed tokens are holes that never match
    pub fn match_slots(&self) -> Vec<Option<Color>> {
        self.tokens.iter().map(Token::match_color).collect()
    }

    fn allocate_id(&mut self) -> TokenId {
        let id = TokenId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        id
    }

    /// Append a token at an explicit distance (stage loading)
    pub fn push_back(&mut self, color: Color, distance: f32) -> TokenId {
        let id = self.allocate_id();
        self.tokens.push(Token::new(id, color, distance));
        id
    }

    /// Insert a new token before `index` and push the rest of the chain along.
    ///
    /// The new token takes the distance of the token it displaces (or one
    /// `spacing` beyond the last token when appending), then every token that
    /// follows it is shifted by exactly `spacing`.
    pub fn insert_before(
        &mut self,
        index: usize,
        color: Color,
        spacing: f32,
    ) -> Result<(usize, TokenId), ChainError> {
        let len = self.tokens.len();
        if index > len {
            return Err(ChainError::IndexOutOfRange { index, len });
        }

        let distance = match self.tokens.get(index) {
            Some(hit) => hit.distance,
            None => self.tokens.last().map_or(0.0, |t| t.distance + spacing),
        };

        let id = self.allocate_id();
        let mut token = Token::new(id, color, distance);
        if let Some(hit) = self.tokens.get(index) {
            token.position = hit.position;
            token.direction = hit.direction;
            token.progress = hit.progress;
        }
        self.tokens.insert(index, token);

        for token in &mut self.tokens[index + 1..] {
            token.distance += spacing;
        }

        Ok((index, id))
    }

    /// Remove `[start, start + count)`. Remaining distances are left as-is;
    /// the hole is closed by the gap animator.
    pub fn remove_range(&mut self, start: usize, count: usize) -> Result<Vec<Token>, ChainError> {
        let len = self.tokens.len();
        let end = start.saturating_add(count);
        if end > len {
            return Err(ChainError::IndexOutOfRange { index: end.saturating_sub(1).max(start), len });
        }
        Ok(self.tokens.drain(start..end).collect())
    }

    /// Flag a token as destroyed by an outside collaborator
    pub fn mark_destroyed(&mut self, id: TokenId) -> bool {
        match self.tokens.iter_mut().find(|t| t.id == id) {
            Some(token) => {
                token.destroyed = true;
                true
            }
            None => false,
        }
    }

    /// Drop destroyed tokens. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|t| !t.destroyed);
        before - self.tokens.len()
    }

    /// Add `delta` to the distance of every token at `index` and beyond
    pub fn shift_from(&mut self, index: usize, delta: f32) {
        if let Some(tail) = self.tokens.get_mut(index..) {
            for token in tail {
                token.distance += delta;
            }
        }
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Whether distances are non-decreasing by index (within `tolerance`)
    pub fn is_ordered(&self, tolerance: f32) -> bool {
        self.tokens
            .windows(2)
            .all(|w| w[1].distance + tolerance >= w[0].distance)
    }
}
