//! The game session, the application lifecycle around one active game.
//!
//! LIFECYCLE:
//!   1. `start()` runs RestoreCommand once, before any command is accepted.
//!   2. `handle()` applies one command, then backs up or clears the
//!      snapshot as the policy says, before returning.
//!   3. Backup failures are reported as events and never undo the command.

use crate::{
    backup::{fresh_game, BackupCommand, RestoreCommand, RestoreOutcome},
    command::GameCommand,
    config::{BackupPolicy, NewGameDefaults},
    event::SessionEvent,
    game::GameAggregate,
    holder::GameHolder,
    store::SnapshotStore,
};

/// What a successfully applied command asks of the backup slot.
enum Trigger {
    Changed,
    Ended,
    Suspended,
}

pub struct GameSession<S: SnapshotStore, D: NewGameDefaults> {
    holder:   GameHolder,
    store:    S,
    defaults: D,
    policy:   BackupPolicy,
}

impl<S: SnapshotStore, D: NewGameDefaults> GameSession<S, D> {
    pub fn new(store: S, defaults: D, policy: BackupPolicy) -> Self {
        Self {
            holder: GameHolder::new(),
            store,
            defaults,
            policy,
        }
    }

    /// Restore the backed-up game or start a fresh one.
    pub fn start(&mut self) -> Vec<SessionEvent> {
        let outcome = RestoreCommand::new(&self.store, &self.defaults).execute(&mut self.holder);
        let event = match outcome {
            RestoreOutcome::Restored { moves, position } => SessionEvent::Restored { moves, position },
            RestoreOutcome::FreshGame { reason } => SessionEvent::FreshGameStarted {
                board_size: self.game().map(|g| g.board_size().get()).unwrap_or_default(),
                reason:     reason.to_string(),
            },
        };
        vec![event]
    }

    pub fn game(&self) -> Option<&GameAggregate> {
        self.holder.game()
    }

    pub fn holder(&self) -> &GameHolder {
        &self.holder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &BackupPolicy {
        &self.policy
    }

    pub fn handle(&mut self, command: GameCommand) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        match command {
            GameCommand::NewGame => {
                self.delete_backup(&mut events);
                let config = self.defaults.new_game_config();
                self.holder.install(fresh_game(&config));
                log::info!("session: started a new {} game", config.board_size);
                events.push(SessionEvent::FreshGameStarted {
                    board_size: config.board_size.get(),
                    reason:     "new game requested".into(),
                });
                return events;
            }
            GameCommand::DiscardBackup => {
                self.delete_backup(&mut events);
                return events;
            }
            _ => {}
        }

        let name = command.name();
        let Some(game) = self.holder.game_mut() else {
            events.push(SessionEvent::CommandRejected {
                command: name.into(),
                reason:  "no active game".into(),
            });
            return events;
        };

        let applied = match command {
            GameCommand::Play { vertex } => game.play(vertex),
            GameCommand::Pass => game.pass(),
            GameCommand::Resign => game.resign(),
            GameCommand::Undo => game.undo(),
            GameCommand::ViewPosition { position } => game.set_current_position(position),
            _ => Ok(()),
        };
        if let Err(e) = applied {
            log::debug!("session: rejected {name}: {e}");
            events.push(SessionEvent::CommandRejected {
                command: name.into(),
                reason:  e.to_string(),
            });
            return events;
        }

        let trigger = match command {
            GameCommand::Play { .. } | GameCommand::Pass => {
                if let Some(&mv) = game.moves().last() {
                    events.push(SessionEvent::MoveCommitted { number: game.moves().len(), mv });
                }
                if game.is_ended() { Trigger::Ended } else { Trigger::Changed }
            }
            GameCommand::Resign => Trigger::Ended,
            GameCommand::Undo => {
                events.push(SessionEvent::Undone {
                    moves:    game.moves().len(),
                    position: game.current_position(),
                });
                Trigger::Changed
            }
            GameCommand::ViewPosition { position } => {
                events.push(SessionEvent::PositionViewed { position });
                Trigger::Changed
            }
            _ => Trigger::Suspended,
        };
        if let Trigger::Ended = trigger {
            events.push(SessionEvent::GameEnded { status: game.status() });
        }

        self.after_change(trigger, &mut events);
        events
    }

    fn after_change(&self, trigger: Trigger, events: &mut Vec<SessionEvent>) {
        let Some(game) = self.holder.game() else { return };
        let game_over = game.is_ended() && self.policy.delete_on_game_end;

        match trigger {
            Trigger::Ended if self.policy.delete_on_game_end => self.delete_backup(events),
            Trigger::Ended => self.backup(game, events),
            Trigger::Changed if self.policy.backup_on_every_move && !game_over => {
                self.backup(game, events)
            }
            Trigger::Changed => {}
            // A finished game whose backup was cleared stays cleared.
            Trigger::Suspended if game_over => {}
            Trigger::Suspended => self.backup(game, events),
        }
    }

    fn backup(&self, game: &GameAggregate, events: &mut Vec<SessionEvent>) {
        match BackupCommand::new(&self.store).execute(game) {
            Ok(()) => events.push(SessionEvent::BackupWritten {
                moves:    game.moves().len(),
                position: game.current_position(),
            }),
            Err(e) => {
                log::warn!("session: backup to {} failed: {e}", self.store.location());
                events.push(SessionEvent::BackupFailed { error: e.to_string() });
            }
        }
    }

    fn delete_backup(&self, events: &mut Vec<SessionEvent>) {
        match self.store.delete() {
            Ok(()) => events.push(SessionEvent::BackupDeleted),
            Err(e) => {
                log::warn!("session: could not delete {}: {e}", self.store.location());
                events.push(SessionEvent::BackupFailed { error: e.to_string() });
            }
        }
    }
}
