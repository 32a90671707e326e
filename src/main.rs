//! BLOCKFALL - falling blocks in the terminal

mod audio;
mod keys;
mod ui;

use anyhow::Context;
use audio::TonePlayer;
use blockfall::{FileStorage, Game, Intents, MemoryStorage, Settings, Silent, SoundPlayer, Storage};
use crossterm::{
    event::{
        self, Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use keys::{KeyMapper, KeyOutcome};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use ui::{TerminalRenderer, View};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the blockfall temp directory, creating it if needed
fn blockfall_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn open_storage() -> Box<dyn Storage> {
    match FileStorage::open_default() {
        Ok(storage) => {
            tracing::info!("High scores in {}", storage.path().display());
            Box::new(storage)
        }
        Err(e) => {
            tracing::warn!("High scores will not persist: {}", e);
            Box::new(MemoryStorage::default())
        }
    }
}

fn open_sound(settings: &Settings) -> Box<dyn SoundPlayer> {
    if settings.audio.sfx_volume == 0 {
        return Box::new(Silent);
    }
    match TonePlayer::new(settings.audio.sfx_volume) {
        Some(player) => Box::new(player),
        None => Box::new(Silent),
    }
}

fn main() -> anyhow::Result<()> {
    let session_id: u32 = rand::random();

    let log_dir = blockfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockfall=debug".parse().context("invalid log directive")?),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "BLOCKFALL starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let mut settings = Settings::load();
    let mut game = Game::new(settings.gameplay.clone(), open_storage(), open_sound(&settings));

    // Release events need the kitty keyboard protocol
    let reports_release = supports_keyboard_enhancement().unwrap_or(false);
    let mut keys = KeyMapper::new(&settings.keys, reports_release, settings.gameplay.starting_level);

    enable_raw_mode()?;
    let result = setup_terminal(reports_release)
        .and_then(|mut terminal| run_app(&mut terminal, &mut game, &mut keys));

    if let Err(e) = restore_terminal(reports_release) {
        tracing::warn!("Could not restore terminal: {}", e);
    }

    if keys.bindings() != &settings.keys {
        settings.keys = keys.bindings().clone();
        if let Err(e) = settings.save() {
            tracing::warn!("Could not save settings: {}", e);
        }
    }

    let score = game.score();
    println!("\nThanks for playing BLOCKFALL!");
    println!("Score: {} | Best: {}", score.points, score.high_score);
    tracing::info!("Shutting down");

    result.context("terminal I/O failed")
}

fn setup_terminal(reports_release: bool) -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    execute!(stdout(), EnterAlternateScreen)?;
    if reports_release {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Undo every terminal mode change. Each step runs even if an earlier one
/// failed; the first error is returned.
fn restore_terminal(reports_release: bool) -> io::Result<()> {
    let popped = if reports_release {
        execute!(stdout(), PopKeyboardEnhancementFlags)
    } else {
        Ok(())
    };
    let raw = disable_raw_mode();
    let screen = execute!(stdout(), LeaveAlternateScreen);
    first_error([popped, raw, screen])
}

/// Results of steps that have all already run, reduced to the first failure
fn first_error(results: impl IntoIterator<Item = io::Result<()>>) -> io::Result<()> {
    results.into_iter().collect()
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    game: &mut Game<Box<dyn SoundPlayer>>,
    keys: &mut KeyMapper,
) -> io::Result<()> {
    let start = Instant::now();
    let mut intents = Intents::new();
    let mut renderer = TerminalRenderer::new(terminal, View::new(keys));

    loop {
        let frame_start = Instant::now();

        // Drain every event that arrives before the next frame is due
        let mut timeout = FRAME_DURATION;
        while event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if keys.handle(key, game.phase(), &mut intents) == KeyOutcome::Quit {
                    return Ok(());
                }
            }
            timeout = FRAME_DURATION.saturating_sub(frame_start.elapsed());
        }

        let now = Instant::now();
        keys.release_stale(now, &mut intents);
        renderer.view = View::new(keys);

        let timestamp = now.duration_since(start).as_millis() as u64;
        game.frame(timestamp, &mut intents, &mut renderer)?;
    }
}
