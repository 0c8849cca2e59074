//! Restore-on-startup tests.
//!
//! Tests cover: the resumed game matching what was backed up, the fresh
//! game fallback when there is no backup, discarding corrupt or
//! unreadable backups, and current settings applied to a resumed game.

use goban_core::{
    backup::{BackupCommand, RestoreCommand, RestoreOutcome},
    config::{GameConfig, KoRule},
    error::{MalformedSnapshotError, ReconstructionError, RestoreFailure, StorageError, StorageResult},
    game::{EndReason, GameAggregate, GameStatus},
    holder::GameHolder,
    reconstruct::reconstruct,
    sgf,
    store::{FileSnapshotStore, SnapshotStore, SqliteSnapshotStore},
    types::{BoardSize, Color, Move, Vertex},
};
use std::cell::Cell;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn v(text: &str) -> Vertex {
    text.parse().expect("valid vertex")
}

fn config(size: u8) -> GameConfig {
    GameConfig {
        board_size: BoardSize::new(size).expect("supported size"),
        ..GameConfig::default()
    }
}

fn sqlite_store() -> SqliteSnapshotStore {
    let store = SqliteSnapshotStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

/// Backs up a 19x19 game with moves A1, B2, pass while position 2 is viewed.
fn backed_up_game(store: &impl SnapshotStore) -> GameAggregate {
    let mut game = GameAggregate::new(&GameConfig::default()).unwrap();
    game.play(v("A1")).unwrap();
    game.play(v("B2")).unwrap();
    game.pass().unwrap();
    game.set_current_position(2).unwrap();
    BackupCommand::new(store).execute(&game).expect("backup");
    game
}

/// A store whose snapshot is present but cannot be read back.
struct UnreadableStore {
    delete_attempts: Cell<usize>,
}

impl SnapshotStore for UnreadableStore {
    fn exists(&self) -> bool {
        true
    }

    fn read(&self) -> StorageResult<Vec<u8>> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "backup is not readable",
        )))
    }

    fn write(&self, _bytes: &[u8]) -> StorageResult<()> {
        Ok(())
    }

    fn delete(&self) -> StorageResult<()> {
        self.delete_attempts.set(self.delete_attempts.get() + 1);
        Ok(())
    }

    fn location(&self) -> String {
        "unreadable://test".into()
    }
}

/// The resumed game has the same moves and views the same position.
#[test]
fn backed_up_game_is_resumed_at_viewed_position() {
    init_logging();
    let store = sqlite_store();
    let original = backed_up_game(&store);

    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &GameConfig::default()).execute(&mut holder);

    assert!(
        matches!(outcome, RestoreOutcome::Restored { moves: 3, position: 2 }),
        "Expected 3 moves at position 2, got {outcome:?}"
    );
    let game = holder.game().expect("active game after restore");
    assert_eq!(game.moves(), original.moves());
    assert_eq!(game.current_position(), 2);
    assert_eq!(game.info().id, original.info().id, "Game id should survive a backup");
    assert_eq!(
        game.current_board().stone_at(v("B2")),
        Some(Color::White),
        "Position 2 shows both stones"
    );
    assert!(store.exists(), "A successful restore leaves the backup in place");
}

/// With no backup, startup installs a fresh game from the defaults.
#[test]
fn missing_backup_starts_fresh_game() {
    init_logging();
    let store = sqlite_store();
    let mut holder = GameHolder::new();

    let outcome = RestoreCommand::new(&store, &GameConfig::default()).execute(&mut holder);

    assert!(matches!(
        outcome,
        RestoreOutcome::FreshGame { reason: RestoreFailure::NoBackup }
    ));
    let game = holder.game().expect("fresh game installed");
    assert_eq!(game.board_size().get(), 19);
    assert!(game.moves().is_empty());
    assert_eq!(game.current_position(), 0);
    assert_eq!(game.status(), GameStatus::InProgress);
}

/// A snapshot that cannot be decoded is deleted and replaced by a fresh game.
#[test]
fn corrupt_backup_is_deleted() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let store = FileSnapshotStore::in_dir(dir.path());
    store.write(b"(;FF[4]SZ[19];B[aa").unwrap();

    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    assert!(
        matches!(outcome, RestoreOutcome::FreshGame { reason: RestoreFailure::Malformed(_) }),
        "Expected a malformed-snapshot fallback, got {outcome:?}"
    );
    assert!(!store.exists(), "Corrupt backup should be deleted");
    let game = holder.game().expect("fresh game installed");
    assert_eq!(game.board_size().get(), 9);
    assert!(game.moves().is_empty());
}

/// A well-formed snapshot whose moves cannot be replayed is treated as corrupt.
#[test]
fn inconsistent_backup_is_deleted() {
    init_logging();
    let store = sqlite_store();
    // White plays onto Black's stone.
    store.write(b"(;FF[4]XF[1]SZ[9]XV[2];B[ee];W[ee])").unwrap();

    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    assert!(
        matches!(outcome, RestoreOutcome::FreshGame { reason: RestoreFailure::Inconsistent(_) }),
        "Expected an inconsistent-snapshot fallback, got {outcome:?}"
    );
    assert!(!store.exists());
    assert!(holder.is_active());
}

/// A viewed position past the last move marks the snapshot as corrupt.
#[test]
fn viewed_position_past_end_is_deleted() {
    init_logging();
    let store = sqlite_store();
    store.write(b"(;FF[4]XF[1]SZ[9]XV[5];B[ee])").unwrap();

    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    assert!(
        matches!(
            outcome,
            RestoreOutcome::FreshGame {
                reason: RestoreFailure::Malformed(MalformedSnapshotError::PositionOutOfRange {
                    position: 5,
                    moves:    1,
                }),
            }
        ),
        "Expected an out-of-range position fallback, got {outcome:?}"
    );
    assert!(!store.exists(), "Snapshot with a bad position should be deleted");
    assert!(holder.game().expect("fresh game installed").moves().is_empty());
}

/// A board size the game model does not support is treated as corrupt.
#[test]
fn unsupported_board_size_is_deleted() {
    init_logging();
    let store = sqlite_store();
    store.write(b"(;FF[4]XF[1]SZ[21]XV[0])").unwrap();

    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    assert!(
        matches!(
            outcome,
            RestoreOutcome::FreshGame {
                reason: RestoreFailure::Inconsistent(ReconstructionError::BoardSize { size: 21 }),
            }
        ),
        "Expected a board size fallback, got {outcome:?}"
    );
    assert!(!store.exists(), "Snapshot with an unsupported size should be deleted");
    assert_eq!(holder.game().expect("fresh game installed").board_size().get(), 9);
}

/// Replay refuses a decoded snapshot whose viewed position has no move.
#[test]
fn replay_rejects_position_past_end() {
    let mut decoded = sgf::deserialize(b"(;FF[4]XF[1]SZ[9]XV[1];B[ee])").expect("valid snapshot");
    decoded.last_viewed = 3;

    let err = reconstruct(&decoded, &config(9)).unwrap_err();

    assert_eq!(
        err,
        ReconstructionError::PositionOutOfRange { position: 3, moves: 1 },
        "Replay must not clamp the viewed position"
    );
}

/// An unreadable snapshot still yields a game, and its removal is attempted.
#[test]
fn unreadable_backup_falls_back_and_is_deleted() {
    init_logging();
    let store = UnreadableStore { delete_attempts: Cell::new(0) };
    let mut holder = GameHolder::new();

    let outcome = RestoreCommand::new(&store, &GameConfig::default()).execute(&mut holder);

    assert!(matches!(
        outcome,
        RestoreOutcome::FreshGame { reason: RestoreFailure::Unreadable(_) }
    ));
    assert_eq!(store.delete_attempts.get(), 1);
    assert!(holder.is_active());
}

/// Komi and ko rule follow the current settings; board size and moves
/// follow the backup.
#[test]
fn current_settings_apply_to_resumed_game() {
    init_logging();
    let store = sqlite_store();
    let mut game = GameAggregate::new(&config(13)).unwrap();
    game.play(v("D4")).unwrap();
    game.play(v("K10")).unwrap();
    BackupCommand::new(&store).execute(&game).unwrap();

    let changed = GameConfig {
        board_size:   BoardSize::new(9).unwrap(),
        komi:         0.5,
        ko_rule:      KoRule::SituationalSuperko,
        black_player: "Alice".into(),
        ..GameConfig::default()
    };
    let mut holder = GameHolder::new();
    let outcome = RestoreCommand::new(&store, &changed).execute(&mut holder);

    assert!(outcome.is_restored(), "Expected restore, got {outcome:?}");
    let restored = holder.game().unwrap();
    assert_eq!(restored.board_size().get(), 13, "Board size comes from the backup");
    assert_eq!(restored.moves(), game.moves());
    assert_eq!(restored.rules().komi, 0.5);
    assert_eq!(restored.rules().ko_rule, KoRule::SituationalSuperko);
    assert_eq!(restored.rules().black_player, "Alice");
}

/// Handicap stones come back, and White is still to move after them.
#[test]
fn handicap_game_is_resumed() {
    init_logging();
    let store = sqlite_store();
    let game = GameAggregate::new(&GameConfig { handicap: 4, ..GameConfig::default() }).unwrap();
    BackupCommand::new(&store).execute(&game).unwrap();

    let mut holder = GameHolder::new();
    RestoreCommand::new(&store, &GameConfig::default()).execute(&mut holder);

    let restored = holder.game().unwrap();
    assert_eq!(restored.handicap(), game.handicap());
    assert_eq!(restored.current_board().stone_count(Color::Black), 4);
    assert_eq!(restored.next_color(), Color::White);
}

/// A resigned game is resumed as resigned.
#[test]
fn resignation_survives_restore() {
    init_logging();
    let store = sqlite_store();
    let mut game = GameAggregate::new(&config(9)).unwrap();
    game.play(v("E5")).unwrap();
    game.resign().unwrap();
    BackupCommand::new(&store).execute(&game).unwrap();

    let mut holder = GameHolder::new();
    RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    let restored = holder.game().unwrap();
    assert_eq!(
        restored.status(),
        GameStatus::Ended(EndReason::Resignation { winner: Color::Black })
    );
}

/// A game ended by two passes is ended again after replay.
#[test]
fn two_pass_ending_survives_restore() {
    init_logging();
    let store = sqlite_store();
    let mut game = GameAggregate::new(&config(9)).unwrap();
    game.pass().unwrap();
    game.pass().unwrap();
    BackupCommand::new(&store).execute(&game).unwrap();

    let mut holder = GameHolder::new();
    RestoreCommand::new(&store, &config(9)).execute(&mut holder);

    let restored = holder.game().unwrap();
    assert_eq!(restored.status(), GameStatus::Ended(EndReason::TwoPasses));
    assert!(restored.moves().iter().all(Move::is_pass));
}

/// Restoring the same backup twice gives the same game.
#[test]
fn restore_is_repeatable() {
    init_logging();
    let store = sqlite_store();
    backed_up_game(&store);

    let mut first = GameHolder::new();
    let mut second = GameHolder::new();
    RestoreCommand::new(&store, &GameConfig::default()).execute(&mut first);
    RestoreCommand::new(&store, &GameConfig::default()).execute(&mut second);

    let (a, b) = (first.game().unwrap(), second.game().unwrap());
    assert_eq!(a.moves(), b.moves());
    assert_eq!(a.current_position(), b.current_position());
    assert_eq!(a.info(), b.info());
}
