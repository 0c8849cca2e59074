//! Rebuild a live game from a decoded snapshot.
//!
//! Structure comes from the snapshot: board size, handicap stones, moves,
//! the viewed position and the game's identity. Rule parameters (komi, ko
//! rule, player names) come from the *current* new-game defaults, so a
//! user who changed settings between sessions sees them applied to the
//! resumed game. Moves are replayed under the ko rule the snapshot was
//! recorded with, so a settings change can never invalidate a game that
//! was legal when it was played.

use crate::{
    config::GameConfig,
    error::ReconstructionError,
    game::{GameAggregate, GameRules},
    snapshot::DecodedSnapshot,
};

pub fn reconstruct(
    snapshot: &DecodedSnapshot,
    defaults: &GameConfig,
) -> Result<GameAggregate, ReconstructionError> {
    let size = snapshot.board_size().ok_or(ReconstructionError::BoardSize {
        size: snapshot.rules.board_size,
    })?;

    let mut replay_rules = GameRules::from(defaults);
    if let Some(recorded) = snapshot.rules.ko_rule {
        replay_rules.ko_rule = recorded;
    }

    let mut game = GameAggregate::with_setup(
        snapshot.game_info(),
        size,
        replay_rules,
        snapshot.handicap.clone(),
    )
    .map_err(|source| ReconstructionError::Handicap { source })?;

    for (i, mv) in snapshot.moves.iter().enumerate() {
        game.apply_move(*mv)
            .map_err(|source| ReconstructionError::IllegalMove { move_number: i + 1, source })?;
    }

    game.refresh_rules(GameRules::from(defaults));

    if let Some(winner) = snapshot.resigned_winner {
        if !game.is_ended() {
            game.restore_resignation(winner);
        }
    }

    // Not clamped: an out-of-range position means the snapshot is corrupt.
    game.set_current_position(snapshot.last_viewed)
        .map_err(|_| ReconstructionError::PositionOutOfRange {
            position: snapshot.last_viewed,
            moves:    snapshot.moves.len(),
        })?;

    log::debug!(
        "reconstruct: {} board, {} moves, viewing position {}",
        size,
        game.moves().len(),
        game.current_position()
    );
    Ok(game)
}
