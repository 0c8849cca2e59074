//! goban-core: resume an in-progress game exactly where it was left.
//!
//! The application backs up the active game after every state change and on
//! suspension. At launch the backup is restored if one exists and is sound;
//! otherwise a fresh game starts from the current new-game defaults.

pub mod backup;
pub mod board;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod holder;
pub mod reconstruct;
pub mod rng;
pub mod session;
pub mod sgf;
pub mod snapshot;
pub mod store;
pub mod types;
