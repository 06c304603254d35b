pub mod app_dirs;
pub mod challenge;
pub mod config;
pub mod game;
pub mod pace;
pub mod palette;
pub mod round;
pub mod runtime;
pub mod stats;
pub mod timer;
pub mod ui;
pub mod util;

use crate::challenge::AnswerOutcome;
use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::game::{GameState, GameStatus};
use crate::round::RoundEngine;
use crate::runtime::{CrosstermEventSource, FixedTicker, Runner, StroopEvent};
use crate::stats::{ColorSummary, StatsDb, RECENT_WINDOW};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};

const TICK_RATE_MS: u64 = 50;

/// sleek stroop-test tui with adaptive pacing and reaction analytics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal Stroop test: name the ink color, not the word. The time budget shrinks as your streak grows, new colors unlock at streak milestones, and every round is recorded for reaction analytics."
)]
pub struct Cli {
    /// number of rounds per session
    #[clap(short = 'r', long)]
    rounds: Option<usize>,

    /// seconds of countdown before the first round
    #[clap(short = 'c', long)]
    countdown_secs: Option<u64>,

    /// number of colors in play at the start (2-9)
    #[clap(long)]
    colors: Option<usize>,

    /// keep the starting palette fixed: no streak-milestone color unlocks
    #[clap(long)]
    no_unlocks: bool,

    /// print recent round history and the all-time best streak, then exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    /// Stored config with CLI overrides applied on top.
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(rounds) = self.rounds {
            cfg.total_rounds = rounds.max(1);
        }
        if let Some(secs) = self.countdown_secs {
            cfg.countdown_secs = secs;
        }
        if let Some(colors) = self.colors {
            cfg.base_palette_size = colors.clamp(2, palette::ALL_COLORS.len());
        }
        if self.no_unlocks {
            cfg.unlocks_enabled = false;
        }
        cfg
    }
}

/// End-of-session analytics shown on the results screen.
#[derive(Debug)]
pub struct SessionReport {
    pub mean_reaction_ms: Option<f64>,
    pub median_reaction_ms: Option<u64>,
    pub std_dev_ms: Option<f64>,
    pub all_time_best_streak: Option<u32>,
    pub color_summary: Vec<ColorSummary>,
}

#[derive(Debug)]
pub struct App {
    pub state: GameState,
    pub engine: RoundEngine,
    pub config: Config,
    pub stats_db: Option<StatsDb>,
    pub report: Option<SessionReport>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let state = GameState::new(config.base_palette_size, config.unlocks_enabled);
        let engine = RoundEngine::new(Duration::from_secs(config.countdown_secs));
        let stats_db = StatsDb::new().ok();
        Self {
            state,
            engine,
            config,
            stats_db,
            report: None,
        }
    }

    pub fn start_session(&mut self) {
        self.report = None;
        self.engine.start_game(&mut self.state, self.config.total_rounds);
    }

    /// Answer with the color at `idx` in the shuffled button order.
    pub fn select_button(&mut self, idx: usize) {
        if let Some(color) = self.state.button_order.get(idx).copied() {
            self.engine.select_color(&mut self.state, color);
        }
        self.after_dispatch();
    }

    /// Post-dispatch bookkeeping: on the transition into Finished, compute
    /// the session report and persist the round history. Runs at most once
    /// per session.
    pub fn after_dispatch(&mut self) {
        if self.state.status != GameStatus::Finished || self.report.is_some() {
            return;
        }

        let success_times: Vec<u64> = self
            .state
            .rounds
            .iter()
            .filter(|r| r.outcome == AnswerOutcome::Success)
            .map(|r| r.reaction_time_ms)
            .collect();
        let mean_reaction_ms = util::mean_ms(&success_times);

        if let Some(db) = self.stats_db.as_mut() {
            let _ = db.record_rounds_batch(&self.state.rounds);
            let _ = db.record_session(&stats::SessionSummary {
                finished_at: chrono::Local::now(),
                total_rounds: self.state.rounds.len(),
                successes: success_times.len(),
                best_streak: self.state.best_streak,
                mean_reaction_ms,
            });
        }

        self.report = Some(SessionReport {
            mean_reaction_ms,
            median_reaction_ms: util::median_ms(&success_times),
            std_dev_ms: util::std_dev_ms(&success_times),
            all_time_best_streak: self
                .stats_db
                .as_ref()
                .and_then(|db| db.all_time_best_streak().ok().flatten()),
            color_summary: self
                .stats_db
                .as_ref()
                .and_then(|db| db.color_summary().ok())
                .unwrap_or_default(),
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.history {
        return print_history();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config = cli.apply_to(FileConfigStore::new().load());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            StroopEvent::Tick => {
                app.engine.on_tick(&mut app.state);
                app.after_dispatch();
            }
            StroopEvent::Resize => {}
            StroopEvent::Focus(gained) => {
                if !gained {
                    app.engine.focus_lost(&mut app.state);
                }
            }
            StroopEvent::Key(key) => {
                if !handle_key(app, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Route a keypress by game status. Returns false to quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return false;
    }

    match app.state.status {
        GameStatus::Idle => {
            if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                app.start_session();
            }
        }
        GameStatus::Countdown => {
            if key.code == KeyCode::Char('r') {
                app.start_session();
            }
        }
        GameStatus::Playing => match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                app.select_button(c as usize - '1' as usize);
            }
            KeyCode::Char('p') => app.engine.pause(&mut app.state),
            KeyCode::Char('r') => app.start_session(),
            _ => {}
        },
        GameStatus::Paused => {
            if app.state.round_answered() {
                // Feedback pause between rounds.
                if matches!(
                    key.code,
                    KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('n')
                ) {
                    app.engine.next_round(&mut app.state);
                }
            } else if matches!(key.code, KeyCode::Char('p') | KeyCode::Char(' ')) {
                app.engine.resume(&mut app.state);
            }
            if key.code == KeyCode::Char('r') {
                app.start_session();
            }
        }
        GameStatus::Finished => {
            if matches!(
                key.code,
                KeyCode::Char('r') | KeyCode::Char('n') | KeyCode::Char(' ') | KeyCode::Enter
            ) {
                app.start_session();
            }
        }
    }

    true
}

/// `--history`: dump the recent window and all-time best without a TTY.
fn print_history() -> Result<(), Box<dyn Error>> {
    let db = StatsDb::new()?;
    let rounds = db.recent_rounds(RECENT_WINDOW)?;

    if rounds.is_empty() {
        println!("no rounds recorded yet");
        return Ok(());
    }

    for r in &rounds {
        println!(
            "{}  {:>7} in {:<7} -> {:<13} {:>5} ms",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.word.label(),
            r.ink_color.label().to_lowercase(),
            r.outcome.to_string(),
            r.reaction_time_ms,
        );
    }
    if let Some(best) = db.all_time_best_streak()? {
        println!("all-time best streak: {best}");
    }

    Ok(())
}
