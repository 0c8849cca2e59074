//! The active-game slot.
//!
//! RULE: There is no global game. Anything that needs the active game is
//! handed a `GameHolder` (or a reference into it) explicitly.

use crate::game::GameAggregate;

#[derive(Debug, Default)]
pub struct GameHolder {
    active: Option<GameAggregate>,
}

impl GameHolder {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Make `game` the active game. Returns the game it replaced, if any.
    pub fn install(&mut self, game: GameAggregate) -> Option<GameAggregate> {
        self.active.replace(game)
    }

    pub fn game(&self) -> Option<&GameAggregate> {
        self.active.as_ref()
    }

    pub fn game_mut(&mut self) -> Option<&mut GameAggregate> {
        self.active.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
