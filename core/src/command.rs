use crate::types::Vertex;
use serde::{Deserialize, Serialize};

/// Everything the host application can ask of the active game.
/// Variants may be added, never renamed: hosts send them as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum GameCommand {
    // ── Play ──────────────────────────────────────
    Play { vertex: Vertex },
    Pass,
    Resign,
    Undo,

    // ── Viewing ───────────────────────────────────
    ViewPosition { position: usize },

    // ── Lifecycle ─────────────────────────────────
    NewGame,
    DiscardBackup,
    Suspend,
}

impl GameCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GameCommand::Play { .. }         => "play",
            GameCommand::Pass                => "pass",
            GameCommand::Resign              => "resign",
            GameCommand::Undo                => "undo",
            GameCommand::ViewPosition { .. } => "view_position",
            GameCommand::NewGame             => "new_game",
            GameCommand::DiscardBackup       => "discard_backup",
            GameCommand::Suspend             => "suspend",
        }
    }
}
