//! The game aggregate: rules, handicap, move history and the viewed position.
//!
//! RULES:
//!   - The move list is append-only while playing. Undo is the only way
//!     to remove a move, and it only removes the last one.
//!   - `boards[i]` is the position after `i` moves; `boards.len()` is
//!     always `moves.len() + 1`.
//!   - The current position index is always within `0..=moves.len()`.

use crate::{
    board::Board,
    config::{GameConfig, KoRule},
    error::{GameError, GameResult},
    rng::ZobristKeys,
    types::{BoardSize, Color, Move, Vertex},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rule parameters refreshed from the new-game defaults on every restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub komi:         f64,
    pub ko_rule:      KoRule,
    pub black_player: String,
    pub white_player: String,
}

impl From<&GameConfig> for GameRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            komi:         config.komi,
            ko_rule:      config.ko_rule,
            black_player: config.black_player.clone(),
            white_player: config.white_player.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EndReason {
    Resignation { winner: Color },
    TwoPasses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Ended(EndReason),
}

/// Identity and provenance of a game, carried through backups unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub id:      Uuid,
    pub started: NaiveDate,
}

impl GameInfo {
    pub fn generate() -> Self {
        Self {
            id:      Uuid::new_v4(),
            started: Utc::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameAggregate {
    info:             GameInfo,
    rules:            GameRules,
    size:             BoardSize,
    handicap:         Vec<Vertex>,
    moves:            Vec<Move>,
    boards:           Vec<Board>,
    current_position: usize,
    status:           GameStatus,
    keys:             ZobristKeys,
}

impl GameAggregate {
    /// Start a fresh game from the new-game defaults, handicap stones placed.
    pub fn new(config: &GameConfig) -> GameResult<Self> {
        let handicap = handicap_vertices(config.board_size, config.handicap)?;
        Self::with_setup(GameInfo::generate(), config.board_size, GameRules::from(config), handicap)
    }

    /// An empty board with no handicap stones. Cannot fail.
    pub fn blank(info: GameInfo, size: BoardSize, rules: GameRules) -> Self {
        Self {
            info,
            rules,
            size,
            handicap: Vec::new(),
            moves: Vec::new(),
            boards: vec![Board::empty(size)],
            current_position: 0,
            status: GameStatus::InProgress,
            keys: ZobristKeys::new(size),
        }
    }

    /// An empty game with explicit identity, size, rules and handicap stones.
    /// This is the starting point for replaying a backed-up move list.
    pub fn with_setup(
        info: GameInfo,
        size: BoardSize,
        rules: GameRules,
        handicap: Vec<Vertex>,
    ) -> GameResult<Self> {
        let mut game = Self::blank(info, size, rules);
        for &vertex in &handicap {
            game.boards[0].setup_stone(vertex, Color::Black, &game.keys)?;
        }
        game.handicap = handicap;
        Ok(game)
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn board_size(&self) -> BoardSize {
        self.size
    }

    pub fn handicap(&self) -> &[Vertex] {
        &self.handicap
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.status, GameStatus::Ended(_))
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    pub fn is_at_latest_position(&self) -> bool {
        self.current_position == self.moves.len()
    }

    /// The board as the user currently sees it.
    pub fn current_board(&self) -> &Board {
        &self.boards[self.current_position]
    }

    pub fn board_at(&self, position: usize) -> Option<&Board> {
        self.boards.get(position)
    }

    /// Whose turn it is after the last recorded move.
    pub fn next_color(&self) -> Color {
        match self.moves.last() {
            Some(last) => last.color().opponent(),
            None if self.handicap.len() >= 2 => Color::White,
            None => Color::Black,
        }
    }

    // ── Play ───────────────────────────────────────────────────

    pub fn play(&mut self, vertex: Vertex) -> GameResult<()> {
        let color = self.next_color();
        self.apply_move(Move::Play { color, vertex })
    }

    pub fn pass(&mut self) -> GameResult<()> {
        let color = self.next_color();
        self.apply_move(Move::Pass { color })
    }

    /// Append a move and view the resulting position.
    ///
    /// Checks only what is needed to rebuild positions: turn order,
    /// occupancy, suicide and position repetition under the ko rule.
    pub fn apply_move(&mut self, mv: Move) -> GameResult<()> {
        if self.is_ended() {
            return Err(GameError::GameOver);
        }
        if !self.is_at_latest_position() {
            return Err(GameError::NotAtLatestPosition);
        }
        let expected = self.next_color();
        if mv.color() != expected {
            return Err(GameError::OutOfTurn { expected, actual: mv.color() });
        }

        let mut board = self.latest_board().clone();
        if let Move::Play { color, vertex } = mv {
            board.place(vertex, color, &self.keys)?;
            if self.repeats_earlier_position(&board, color) {
                return Err(GameError::Ko { vertex });
            }
        }

        let two_passes = mv.is_pass() && self.moves.last().is_some_and(Move::is_pass);
        self.moves.push(mv);
        self.boards.push(board);
        self.current_position = self.moves.len();
        if two_passes {
            self.status = GameStatus::Ended(EndReason::TwoPasses);
        }
        Ok(())
    }

    pub fn resign(&mut self) -> GameResult<()> {
        if self.is_ended() {
            return Err(GameError::GameOver);
        }
        let loser = self.next_color();
        self.status = GameStatus::Ended(EndReason::Resignation { winner: loser.opponent() });
        Ok(())
    }

    /// Reopen a resigned game, or take back the last move.
    pub fn undo(&mut self) -> GameResult<()> {
        if let GameStatus::Ended(EndReason::Resignation { .. }) = self.status {
            self.status = GameStatus::InProgress;
            return Ok(());
        }
        if self.moves.pop().is_none() {
            return Err(GameError::NothingToUndo);
        }
        self.boards.pop();
        self.status = GameStatus::InProgress;
        self.current_position = self.current_position.min(self.moves.len());
        Ok(())
    }

    /// Swap in rule parameters after a backup has been replayed.
    pub(crate) fn refresh_rules(&mut self, rules: GameRules) {
        self.rules = rules;
    }

    /// Mark the game as resigned while rebuilding it from a backup.
    pub(crate) fn restore_resignation(&mut self, winner: Color) {
        self.status = GameStatus::Ended(EndReason::Resignation { winner });
    }

    // ── Viewing ────────────────────────────────────────────────

    pub fn set_current_position(&mut self, position: usize) -> GameResult<()> {
        if position > self.moves.len() {
            return Err(GameError::PositionOutOfRange {
                position,
                moves: self.moves.len(),
            });
        }
        self.current_position = position;
        Ok(())
    }

    fn latest_board(&self) -> &Board {
        // `boards` always holds at least the initial position.
        &self.boards[self.boards.len() - 1]
    }

    fn repeats_earlier_position(&self, board: &Board, mover: Color) -> bool {
        match self.rules.ko_rule {
            KoRule::Simple => {
                // The position before the opponent's last move.
                let n = self.boards.len();
                n >= 2 && self.boards[n - 2].hash() == board.hash()
            }
            KoRule::PositionalSuperko => self.boards.iter().any(|b| b.hash() == board.hash()),
            KoRule::SituationalSuperko => {
                let to_move = mover.opponent();
                let target = board.hash() ^ self.keys.side_to_move(to_move);
                self.boards
                    .iter()
                    .zip(self.side_to_move_history())
                    .any(|(b, side)| b.hash() ^ self.keys.side_to_move(side) == target)
            }
        }
    }

    /// Side to move at each recorded position, aligned with `boards`.
    fn side_to_move_history(&self) -> impl Iterator<Item = Color> + '_ {
        let first = if self.handicap.len() >= 2 { Color::White } else { Color::Black };
        std::iter::once(first).chain(self.moves.iter().map(|m| m.color().opponent()))
    }
}

/// Standard star-point placement for `count` handicap stones.
pub fn handicap_vertices(size: BoardSize, count: u8) -> GameResult<Vec<Vertex>> {
    let edge = size.get();
    let max = if edge <= 7 { 4 } else { 9 };
    if count > max {
        return Err(GameError::InvalidHandicap { handicap: count, size: edge });
    }
    // A handicap of one means Black simply moves first without komi adjustment.
    if count < 2 {
        return Ok(Vec::new());
    }

    let low = if edge < 13 { 2 } else { 3 };
    let high = edge - 1 - low;
    let mid = edge / 2;

    let corners = [(high, high), (low, low), (high, low), (low, high)];
    let sides = [(low, mid), (high, mid), (mid, high), (mid, low)];
    let centre = (mid, mid);

    let mut points: Vec<(u8, u8)> = corners.iter().take(count.min(4) as usize).copied().collect();
    match count {
        5 => points.push(centre),
        6 => points.extend(&sides[..2]),
        7 => {
            points.extend(&sides[..2]);
            points.push(centre);
        }
        8 => points.extend(&sides),
        9 => {
            points.extend(&sides);
            points.push(centre);
        }
        _ => {}
    }
    Ok(points.into_iter().map(|(x, y)| Vertex::new(x, y)).collect())
}
