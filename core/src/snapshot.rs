//! Decoded snapshot: what a backup says about the game it came from.
//!
//! A snapshot is the only backup there is: one overwritable slot, written
//! after every state change and read once at startup. Rule parameters in
//! here are informational; the restored game takes them from the current
//! new-game defaults. Board size, handicap stones, moves and the viewed
//! position are structural and restored verbatim.

use crate::{
    config::KoRule,
    game::{GameInfo, GameStatus},
    types::{BoardSize, Color, Move, Vertex},
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Current on-disk snapshot format. Any other version is rejected as malformed.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Rule parameters as they were when the snapshot was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct RulesSummary {
    pub board_size:   u8,
    pub komi:         Option<f64>,
    pub ko_rule:      Option<KoRule>,
    pub handicap:     u8,
    pub black_player: Option<String>,
    pub white_player: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedSnapshot {
    pub rules:           RulesSummary,
    pub handicap:        Vec<Vertex>,
    pub moves:           Vec<Move>,
    pub last_viewed:     usize,
    pub game_id:         Option<Uuid>,
    pub started:         Option<NaiveDate>,
    /// Winner if the game ended by resignation. Two-pass endings are
    /// implied by the move list.
    pub resigned_winner: Option<Color>,
}

impl DecodedSnapshot {
    /// The snapshot's board size, if it is one the game model accepts.
    pub fn board_size(&self) -> Option<BoardSize> {
        BoardSize::new(self.rules.board_size).ok()
    }

    /// Identity for the restored game. Snapshots lacking one get a fresh id.
    pub fn game_info(&self) -> GameInfo {
        let generated = GameInfo::generate();
        GameInfo {
            id:      self.game_id.unwrap_or(generated.id),
            started: self.started.unwrap_or(generated.started),
        }
    }
}

/// True if a status should be written as a resignation result.
pub(crate) fn resignation_winner(status: GameStatus) -> Option<Color> {
    match status {
        GameStatus::Ended(crate::game::EndReason::Resignation { winner }) => Some(winner),
        _ => None,
    }
}
