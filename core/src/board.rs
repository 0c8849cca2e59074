//! Stone placement and capture.
//!
//! The board only knows what it takes to rebuild a position from a move
//! list: occupancy, captures and suicide. Ko is judged by the game, which
//! owns the position history.

use crate::{
    error::{GameError, GameResult},
    rng::ZobristKeys,
    types::{BoardSize, Color, Vertex},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size:   BoardSize,
    points: Vec<Option<Color>>,
    hash:   u64,
}

impl Board {
    pub fn empty(size: BoardSize) -> Self {
        Self {
            size,
            points: vec![None; size.points()],
            hash: 0,
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    /// Zobrist hash of the stone arrangement.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn stone_at(&self, vertex: Vertex) -> Option<Color> {
        if !self.size.contains(vertex) {
            return None;
        }
        self.points[vertex.index(self.size)]
    }

    pub fn stone_count(&self, color: Color) -> usize {
        self.points.iter().filter(|p| **p == Some(color)).count()
    }

    /// Put a stone down without resolving captures. Used for handicap setup.
    pub fn setup_stone(&mut self, vertex: Vertex, color: Color, keys: &ZobristKeys) -> GameResult<()> {
        self.check_empty(vertex)?;
        self.set(vertex, Some(color), keys);
        Ok(())
    }

    /// Play a stone, remove captured opponent groups and reject suicide.
    /// Returns the number of captured stones.
    pub fn place(&mut self, vertex: Vertex, color: Color, keys: &ZobristKeys) -> GameResult<usize> {
        self.check_empty(vertex)?;
        self.set(vertex, Some(color), keys);

        let mut captured = 0;
        for neighbour in vertex.neighbours(self.size) {
            if self.stone_at(neighbour) == Some(color.opponent()) {
                let group = self.group(neighbour);
                if !self.has_liberty(&group) {
                    captured += group.len();
                    for stone in group {
                        self.set(stone, None, keys);
                    }
                }
            }
        }

        if captured == 0 && !self.has_liberty(&self.group(vertex)) {
            self.set(vertex, None, keys);
            return Err(GameError::Suicide { vertex });
        }
        Ok(captured)
    }

    fn check_empty(&self, vertex: Vertex) -> GameResult<()> {
        if !self.size.contains(vertex) {
            return Err(GameError::OffBoard { vertex });
        }
        if self.stone_at(vertex).is_some() {
            return Err(GameError::Occupied { vertex });
        }
        Ok(())
    }

    fn set(&mut self, vertex: Vertex, stone: Option<Color>, keys: &ZobristKeys) {
        let slot = vertex.index(self.size);
        if let Some(old) = self.points[slot] {
            self.hash ^= keys.stone(vertex, old);
        }
        if let Some(new) = stone {
            self.hash ^= keys.stone(vertex, new);
        }
        self.points[slot] = stone;
    }

    /// All stones connected to the one at `start`.
    fn group(&self, start: Vertex) -> Vec<Vertex> {
        let color = self.stone_at(start);
        let mut seen = vec![false; self.points.len()];
        let mut stack = vec![start];
        let mut group = Vec::new();
        seen[start.index(self.size)] = true;

        while let Some(vertex) = stack.pop() {
            group.push(vertex);
            for neighbour in vertex.neighbours(self.size) {
                let slot = neighbour.index(self.size);
                if !seen[slot] && self.points[slot] == color {
                    seen[slot] = true;
                    stack.push(neighbour);
                }
            }
        }
        group
    }

    fn has_liberty(&self, group: &[Vertex]) -> bool {
        group.iter().any(|stone| {
            stone
                .neighbours(self.size)
                .any(|n| self.stone_at(n).is_none())
        })
    }
}
