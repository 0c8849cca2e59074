use crate::types::{Color, Vertex};
use thiserror::Error;

/// The backup artifact could not be read or written at the I/O layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No backup present at {location}")]
    Missing { location: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Could not replace backup atomically: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// The snapshot bytes do not conform to the backup encoding.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MalformedSnapshotError {
    #[error("Snapshot is not valid UTF-8")]
    NotUtf8,

    #[error("Snapshot ends unexpectedly")]
    Truncated,

    #[error("Unexpected {found:?} at offset {offset}")]
    Unexpected { offset: usize, found: char },

    #[error("Snapshot is missing required property {property}")]
    MissingProperty { property: &'static str },

    #[error("Invalid value {value:?} for property {property}")]
    InvalidValue { property: String, value: String },

    #[error("Unsupported snapshot format version {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Viewed position {position} is out of range for {moves} moves")]
    PositionOutOfRange { position: usize, moves: usize },

    #[error("Snapshot contains variations; only a single main line is supported")]
    Variations,

    #[error("Property {property} appears twice in one node")]
    DuplicateProperty { property: String },

    #[error("Property {property} is not allowed in this node")]
    UnexpectedProperty { property: String },
}

/// Decoded snapshot data is structurally inconsistent with the game it describes.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconstructionError {
    #[error("Snapshot board size {size} is not supported")]
    BoardSize { size: u8 },

    #[error("Handicap stones are inconsistent: {source}")]
    Handicap { source: GameError },

    #[error("Move {move_number} cannot be replayed: {source}")]
    IllegalMove { move_number: usize, source: GameError },

    #[error("Viewed position {position} is out of range for {moves} moves")]
    PositionOutOfRange { position: usize, moves: usize },
}

/// Structural violations raised by the game model itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("The game has ended")]
    GameOver,

    #[error("It is {expected:?}'s turn, not {actual:?}'s")]
    OutOfTurn { expected: Color, actual: Color },

    #[error("{vertex} is off the board")]
    OffBoard { vertex: Vertex },

    #[error("{vertex} is already occupied")]
    Occupied { vertex: Vertex },

    #[error("Playing {vertex} would be suicide")]
    Suicide { vertex: Vertex },

    #[error("Playing {vertex} repeats an earlier position")]
    Ko { vertex: Vertex },

    #[error("Moves can only be played at the latest position")]
    NotAtLatestPosition,

    #[error("There is nothing to undo")]
    NothingToUndo,

    #[error("Position {position} is out of range for {moves} moves")]
    PositionOutOfRange { position: usize, moves: usize },

    #[error("Board size {size} is not supported")]
    InvalidBoardSize { size: u8 },

    #[error("Handicap {handicap} is not possible on a {size}x{size} board")]
    InvalidHandicap { handicap: u8, size: u8 },

    #[error("Invalid vertex {text:?}")]
    InvalidVertex { text: String },
}

/// Why startup fell back to a fresh game instead of restoring the backup.
#[derive(Error, Debug)]
pub enum RestoreFailure {
    #[error("no backup present")]
    NoBackup,

    #[error("backup unreadable: {0}")]
    Unreadable(#[from] StorageError),

    #[error("backup malformed: {0}")]
    Malformed(#[from] MalformedSnapshotError),

    #[error("backup inconsistent: {0}")]
    Inconsistent(#[from] ReconstructionError),
}

impl RestoreFailure {
    /// A snapshot was present but unusable and should be cleared.
    pub fn snapshot_is_bad(&self) -> bool {
        !matches!(self, RestoreFailure::NoBackup)
    }
}

pub type GameResult<T> = Result<T, GameError>;
pub type StorageResult<T> = Result<T, StorageError>;
