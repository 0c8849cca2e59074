//! What happened in response to a startup or a command.
//!
//! Hosts render these; tests assert on them. Each variant is emitted by
//! exactly one place in `session.rs`.

use crate::{
    game::GameStatus,
    types::Move,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    // ── Startup ────────────────────────────────────
    Restored {
        moves:    usize,
        position: usize,
    },
    FreshGameStarted {
        board_size: u8,
        reason:     String,
    },

    // ── Game events ────────────────────────────────
    MoveCommitted {
        number: usize,
        #[serde(rename = "move")]
        mv:     Move,
    },
    Undone {
        moves:    usize,
        position: usize,
    },
    PositionViewed {
        position: usize,
    },
    GameEnded {
        status: GameStatus,
    },
    CommandRejected {
        command: String,
        reason:  String,
    },

    // ── Backup events ──────────────────────────────
    BackupWritten {
        moves:    usize,
        position: usize,
    },
    BackupFailed {
        error: String,
    },
    BackupDeleted,
}
