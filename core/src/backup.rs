//! Backup and restore commands.
//!
//! RESTORE ORDER (fixed, each step short-circuits to FreshGame):
//!   1. exists?      no  → FreshGame (nothing to clean up)
//!   2. read         err → delete snapshot, FreshGame
//!   3. deserialize  err → delete snapshot, FreshGame
//!   4. reconstruct  err → delete snapshot, FreshGame
//!   5. install the reconstructed game → Restored
//!
//! Exactly one of FreshGame / Restored is reached, and either way the
//! holder has an active game when `RestoreCommand::execute` returns.

use crate::{
    config::{GameConfig, NewGameDefaults},
    error::{RestoreFailure, StorageResult},
    game::{GameAggregate, GameInfo, GameRules},
    holder::GameHolder,
    reconstruct::reconstruct,
    sgf,
    store::SnapshotStore,
};

/// Serialize the active game and its viewed position into the backup slot.
///
/// Runs synchronously: suspension may be followed by termination, so the
/// write must be complete (or have failed) before the caller returns.
pub struct BackupCommand<'a, S: SnapshotStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SnapshotStore + ?Sized> BackupCommand<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn execute(&self, game: &GameAggregate) -> StorageResult<()> {
        let bytes = sgf::serialize(game, game.current_position());
        self.store.write(&bytes)?;
        log::debug!(
            "backup: wrote {} bytes to {} ({} moves, position {})",
            bytes.len(),
            self.store.location(),
            game.moves().len(),
            game.current_position()
        );
        Ok(())
    }
}

#[derive(Debug)]
pub enum RestoreOutcome {
    Restored { moves: usize, position: usize },
    FreshGame { reason: RestoreFailure },
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

/// Install either the backed-up game or a fresh one. Runs once at startup.
pub struct RestoreCommand<'a, S: SnapshotStore + ?Sized, D: NewGameDefaults + ?Sized> {
    store:    &'a S,
    defaults: &'a D,
}

impl<'a, S, D> RestoreCommand<'a, S, D>
where
    S: SnapshotStore + ?Sized,
    D: NewGameDefaults + ?Sized,
{
    pub fn new(store: &'a S, defaults: &'a D) -> Self {
        Self { store, defaults }
    }

    pub fn execute(&self, holder: &mut GameHolder) -> RestoreOutcome {
        let config = self.defaults.new_game_config();

        match self.try_restore(&config) {
            Ok(game) => {
                let outcome = RestoreOutcome::Restored {
                    moves:    game.moves().len(),
                    position: game.current_position(),
                };
                log::info!(
                    "restore: resumed game {} from {} ({} moves, viewing position {})",
                    game.info().id,
                    self.store.location(),
                    game.moves().len(),
                    game.current_position()
                );
                holder.install(game);
                outcome
            }
            Err(reason) => {
                if reason.snapshot_is_bad() {
                    log::warn!("restore: {reason}; discarding {}", self.store.location());
                    if let Err(e) = self.store.delete() {
                        log::warn!("restore: could not delete bad backup: {e}");
                    }
                }
                holder.install(fresh_game(&config));
                log::info!("restore: started a new {} game", config.board_size);
                RestoreOutcome::FreshGame { reason }
            }
        }
    }

    fn try_restore(&self, config: &GameConfig) -> Result<GameAggregate, RestoreFailure> {
        if !self.store.exists() {
            return Err(RestoreFailure::NoBackup);
        }
        let bytes = self.store.read()?;
        let decoded = sgf::deserialize(&bytes)?;
        Ok(reconstruct(&decoded, config)?)
    }
}

/// A new game from the given defaults, with no backup round-trip.
///
/// Never fails: a handicap the board cannot take is dropped with a warning
/// rather than leaving the application without a game.
pub fn fresh_game(config: &GameConfig) -> GameAggregate {
    GameAggregate::new(config).unwrap_or_else(|e| {
        log::warn!("restore: {e}; starting without handicap");
        GameAggregate::blank(GameInfo::generate(), config.board_size, GameRules::from(config))
    })
}
