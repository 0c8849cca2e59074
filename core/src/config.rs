//! New-game defaults and backup policy.
//!
//! RULE: This subsystem never writes configuration. Settings are owned by
//! the host application; restore and fresh-game paths only read them.

use crate::types::BoardSize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KoRule {
    #[default]
    Simple,
    PositionalSuperko,
    SituationalSuperko,
}

impl KoRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            KoRule::Simple => "simple-ko",
            KoRule::PositionalSuperko => "positional-superko",
            KoRule::SituationalSuperko => "situational-superko",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "simple-ko" => Some(KoRule::Simple),
            "positional-superko" => Some(KoRule::PositionalSuperko),
            "situational-superko" => Some(KoRule::SituationalSuperko),
            _ => None,
        }
    }
}

/// Parameters used whenever a new game is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board_size:   BoardSize,
    pub handicap:     u8,
    pub komi:         f64,
    pub ko_rule:      KoRule,
    pub black_player: String,
    pub white_player: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size:   BoardSize::NINETEEN,
            handicap:     0,
            komi:         6.5,
            ko_rule:      KoRule::Simple,
            black_player: "Black".into(),
            white_player: "White".into(),
        }
    }
}

/// When the backup slot is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupPolicy {
    /// Delete the snapshot as soon as a game ends by resignation or two passes.
    /// When false the finished game is backed up and restored like any other.
    pub delete_on_game_end: bool,
    /// Back up after every committed move and undo. Suspension always backs up.
    pub backup_on_every_move: bool,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            delete_on_game_end:   true,
            backup_on_every_move: true,
        }
    }
}

/// Read-only view of the current new-game settings.
///
/// Called on every fresh start and every restore, so implementations must
/// reflect settings changed since the previous session.
pub trait NewGameDefaults {
    fn new_game_config(&self) -> GameConfig;
}

impl NewGameDefaults for GameConfig {
    fn new_game_config(&self) -> GameConfig {
        self.clone()
    }
}

/// Defaults stored as JSON, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileDefaults {
    path: PathBuf,
}

impl JsonFileDefaults {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl NewGameDefaults for JsonFileDefaults {
    fn new_game_config(&self) -> GameConfig {
        if !self.path.exists() {
            return GameConfig::default();
        }
        match read_json::<GameConfig>(&self.path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("config: {e:#}; using built-in new-game defaults");
                GameConfig::default()
            }
        }
    }
}

impl GameConfig {
    /// Config with hardcoded values for use in tests.
    pub fn default_test() -> Self {
        Self {
            board_size:   BoardSize::new(9).unwrap_or_default(),
            handicap:     0,
            komi:         7.0,
            ko_rule:      KoRule::PositionalSuperko,
            black_player: "Test Black".into(),
            white_player: "Test White".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub new_game: JsonFileDefaults,
    pub backup:   BackupPolicy,
}

impl AppConfig {
    /// Load from a data directory holding `new_game.json` and `backup.json`.
    /// `backup.json` is parsed here and must be valid if present. New-game
    /// settings are only read when a game is created or restored, and a bad
    /// `new_game.json` falls back to built-in defaults at that point.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let new_game = JsonFileDefaults::new(Path::new(data_dir).join("new_game.json"));

        let backup_path = Path::new(data_dir).join("backup.json");
        let backup = if backup_path.exists() {
            read_json(&backup_path)?
        } else {
            BackupPolicy::default()
        };

        Ok(Self { new_game, backup })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
    Ok(value)
}
