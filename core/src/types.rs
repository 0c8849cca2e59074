//! Shared primitive types used across the game model and the snapshot codec.

use crate::error::GameError;
use serde::de::{Deserializer, Error as DeserializeError, Unexpected, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column letters in board notation. `I` is skipped by convention.
const COLUMN_LETTERS: &[u8] = b"ABCDEFGHJKLMNOPQRST";

/// Board sizes the application supports.
pub const SUPPORTED_BOARD_SIZES: [u8; 7] = [7, 9, 11, 13, 15, 17, 19];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// The single-letter tag used by move records (`B` / `W`).
    pub fn tag(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

/// Edge length of a square board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BoardSize(u8);

impl BoardSize {
    pub const NINETEEN: BoardSize = BoardSize(19);

    pub fn new(size: u8) -> Result<Self, GameError> {
        if SUPPORTED_BOARD_SIZES.contains(&size) {
            Ok(Self(size))
        } else {
            Err(GameError::InvalidBoardSize { size })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Number of intersections on the board.
    pub fn points(self) -> usize {
        self.0 as usize * self.0 as usize
    }

    pub fn contains(self, vertex: Vertex) -> bool {
        vertex.x < self.0 && vertex.y < self.0
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self::NINETEEN
    }
}

impl TryFrom<u8> for BoardSize {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        BoardSize::new(value)
    }
}

impl From<BoardSize> for u8 {
    fn from(size: BoardSize) -> u8 {
        size.0
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.0, self.0)
    }
}

/// An intersection, zero-based, with `y` counted from the bottom edge.
///
/// Written as a column letter followed by a row number, e.g. `A1` is the
/// lower-left corner and `T19` the upper-right corner of a 19x19 board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub x: u8,
    pub y: u8,
}

impl Vertex {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Row-major index into a board of the given size.
    pub fn index(self, size: BoardSize) -> usize {
        self.y as usize * size.get() as usize + self.x as usize
    }

    /// Orthogonal neighbours that lie on the board.
    pub fn neighbours(self, size: BoardSize) -> impl Iterator<Item = Vertex> {
        let edge = size.get();
        let (x, y) = (self.x, self.y);
        [
            (x > 0).then(|| Vertex::new(x - 1, y)),
            (x + 1 < edge).then(|| Vertex::new(x + 1, y)),
            (y > 0).then(|| Vertex::new(x, y - 1)),
            (y + 1 < edge).then(|| Vertex::new(x, y + 1)),
        ]
        .into_iter()
        .flatten()
    }
}

impl FromStr for Vertex {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidVertex { text: s.to_string() };
        let mut chars = s.chars();
        let column = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        let x = COLUMN_LETTERS
            .iter()
            .position(|&c| c as char == column)
            .ok_or_else(invalid)?;
        let row: u8 = chars.as_str().parse().map_err(|_| invalid())?;
        if row == 0 || row as usize > COLUMN_LETTERS.len() {
            return Err(invalid());
        }
        Ok(Vertex::new(x as u8, row - 1))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match COLUMN_LETTERS.get(self.x as usize) {
            Some(&letter) => write!(f, "{}{}", letter as char, self.y as u32 + 1),
            None => write!(f, "?{}", self.y as u32 + 1),
        }
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Serialize for Vertex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct VertexVisitor;

impl<'de> Visitor<'de> for VertexVisitor {
    type Value = Vertex;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a column letter (A-T, no I) followed by a row number, e.g. \"D4\"")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: DeserializeError,
    {
        v.parse::<Vertex>()
            .map_err(|_| DeserializeError::invalid_value(Unexpected::Str(v), &self))
    }
}

impl<'de> Deserialize<'de> for Vertex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(VertexVisitor)
    }
}

/// One entry of the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Move {
    Play { color: Color, vertex: Vertex },
    Pass { color: Color },
}

impl Move {
    pub fn color(&self) -> Color {
        match self {
            Move::Play { color, .. } | Move::Pass { color } => *color,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass { .. })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Move::Play { color, vertex } => write!(f, "{} {}", color.tag(), vertex),
            Move::Pass { color } => write!(f, "{} pass", color.tag()),
        }
    }
}
