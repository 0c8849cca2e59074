//! goban-runner: headless host for a resumable game.
//!
//! Usage:
//!   goban-runner --data-dir ./data
//!   goban-runner --data-dir ./data --sqlite ./data/backup.db
//!   goban-runner --backup /tmp/backup.sgf --summary
//!
//! Reads one JSON request per line on stdin:
//!   {"type":"command","command":{"cmd":"play","vertex":"D4"}}
//!   {"type":"get_state"}
//!   {"type":"quit"}
//! and answers each with one JSON state line. EOF and `quit` both count as
//! the application being suspended, so the game is backed up on the way out.

use anyhow::Result;
use goban_core::{
    command::GameCommand,
    config::{AppConfig, JsonFileDefaults},
    event::SessionEvent,
    game::{GameAggregate, GameStatus},
    session::GameSession,
    store::{FileSnapshotStore, SnapshotStore, SqliteSnapshotStore},
    types::{Color, Move, Vertex},
};
use std::env;
use std::io::{self, BufRead, Write};

type Session = GameSession<Box<dyn SnapshotStore>, JsonFileDefaults>;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    Command { command: GameCommand },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    board_size: u8,
    moves:      &'a [Move],
    position:   usize,
    status:     GameStatus,
    to_move:    Color,
    komi:       f64,
    /// Rows from the top edge down: `X` black, `O` white, `.` empty.
    board:      Vec<String>,
    events:     &'a [SessionEvent],
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");
    let summary_only = args.iter().any(|a| a == "--summary");

    let config = AppConfig::load(data_dir)?;
    log::info!("runner: new-game settings from {}", config.new_game.path().display());

    let store: Box<dyn SnapshotStore> = match arg_value(&args, "--sqlite") {
        Some(db) => {
            let store = SqliteSnapshotStore::open(db)?;
            store.migrate()?;
            Box::new(store)
        }
        None => match arg_value(&args, "--backup") {
            Some(path) => Box::new(FileSnapshotStore::new(path)),
            None => Box::new(FileSnapshotStore::in_dir(data_dir)),
        },
    };
    log::info!("runner: backup location {}", store.location());

    let mut session: Session = GameSession::new(store, config.new_game, config.backup);
    let startup = session.start();

    if summary_only {
        print_summary(&session, &startup);
        return Ok(());
    }

    let mut stdout = io::stdout();
    write_state(&mut stdout, &session, &startup)?;
    run_ipc_loop(&mut session, &mut stdout)?;
    Ok(())
}

fn run_ipc_loop(session: &mut Session, stdout: &mut impl Write) -> Result<()> {
    let stdin = io::stdin();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => write_state(stdout, session, &[])?,
            IpcRequest::Command { command } => {
                let events = session.handle(command);
                write_state(stdout, session, &events)?;
            }
        }
    }

    let events = session.handle(GameCommand::Suspend);
    for event in &events {
        if let SessionEvent::BackupFailed { error } = event {
            log::warn!("runner: final backup failed: {error}");
        }
    }
    Ok(())
}

fn write_state(stdout: &mut impl Write, session: &Session, events: &[SessionEvent]) -> Result<()> {
    match session.game() {
        Some(game) => {
            let state = build_ui_state(game, events);
            writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
        }
        None => writeln!(stdout, "{}", serde_json::json!({ "error": "no active game" }))?,
    }
    stdout.flush()?;
    Ok(())
}

fn build_ui_state<'a>(game: &'a GameAggregate, events: &'a [SessionEvent]) -> UiState<'a> {
    let size = game.board_size();
    let board = game.current_board();
    let rows: Vec<String> = (0..size.get())
        .rev()
        .map(|y| {
            (0..size.get())
                .map(|x| match board.stone_at(Vertex::new(x, y)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                })
                .collect::<String>()
        })
        .collect();

    UiState {
        board_size: size.get(),
        moves:      game.moves(),
        position:   game.current_position(),
        status:     game.status(),
        to_move:    game.next_color(),
        komi:       game.rules().komi,
        board:      rows,
        events,
    }
}

fn print_summary(session: &Session, startup: &[SessionEvent]) {
    println!("goban-runner");
    println!("  backup:    {}", session.store().location());
    let policy = session.policy();
    println!(
        "  policy:    backup every move: {}, delete on game end: {}",
        policy.backup_on_every_move, policy.delete_on_game_end
    );
    for event in startup {
        match event {
            SessionEvent::Restored { moves, position } => {
                println!("  restored:  {moves} moves, viewing position {position}");
            }
            SessionEvent::FreshGameStarted { reason, .. } => {
                println!("  new game:  {reason}");
            }
            other => println!("  event:     {other:?}"),
        }
    }
    if let Some(game) = session.game() {
        println!("  game id:   {}", game.info().id);
        println!("  board:     {}", game.board_size());
        println!("  komi:      {}", game.rules().komi);
        println!("  ko rule:   {}", game.rules().ko_rule.as_str());
        println!("  handicap:  {}", game.handicap().len());
        println!("  moves:     {}", game.moves().len());
        println!("  status:    {:?}", game.status());
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
