use crate::challenge::{classify, generate_challenge, AnswerOutcome, StroopChallenge};
use crate::palette::{base_palette, bonus_colors, ColorName};
use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Streak values at which the next bonus color joins the palette.
pub const UNLOCK_MILESTONES: [u32; 4] = [5, 10, 15, 20];

/// How many rounds a session runs by default.
pub const DEFAULT_TOTAL_ROUNDS: usize = 10;

/// Durable history is truncated to this many most-recent rounds.
pub const HISTORY_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Idle,
    Countdown,
    Playing,
    Paused,
    Finished,
}

/// Immutable record of one completed round, appended on answer or timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResult {
    pub challenge: StroopChallenge,
    pub selected_color: Option<ColorName>,
    pub outcome: AnswerOutcome,
    pub reaction_time_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// The durable slice of a session: round history and the best streak.
/// Transient state (active challenge, round clock, status) stays out on
/// purpose; a restored session always wakes up idle.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameSnapshot {
    pub rounds: Vec<RoundResult>,
    pub best_streak: u32,
}

/// Session aggregate. Owned by the host and mutated only through the
/// action methods below; every action is a silent no-op when its source
/// state does not apply, so late or duplicate dispatches (a timeout
/// firing after a manual answer, say) cannot corrupt a session.
#[derive(Debug)]
pub struct GameState {
    pub status: GameStatus,
    pub current_challenge: Option<StroopChallenge>,
    pub round_start: Option<Instant>,
    pub rounds: Vec<RoundResult>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_rounds: usize,
    pub current_round_number: usize,
    pub active_colors: Vec<ColorName>,
    pub button_order: Vec<ColorName>,
    base_palette_size: usize,
    unlocks_enabled: bool,
}

impl GameState {
    pub fn new(base_palette_size: usize, unlocks_enabled: bool) -> Self {
        let active_colors = base_palette(base_palette_size);
        let button_order = active_colors.clone();
        Self {
            status: GameStatus::Idle,
            current_challenge: None,
            round_start: None,
            rounds: vec![],
            current_streak: 0,
            best_streak: 0,
            total_rounds: DEFAULT_TOTAL_ROUNDS,
            current_round_number: 0,
            active_colors,
            button_order,
            base_palette_size,
            unlocks_enabled,
        }
    }

    /// Begin a fresh session. Allowed from any state, including a finished
    /// one; counters and palette reset, the first challenge is generated,
    /// and the session enters the countdown. The round driver flips
    /// countdown -> playing once the countdown delay passes.
    pub fn start_game(&mut self, total_rounds: usize) {
        self.rounds.clear();
        self.current_streak = 0;
        self.best_streak = 0;
        self.total_rounds = total_rounds.max(1);
        self.current_round_number = 1;
        self.active_colors = base_palette(self.base_palette_size);
        self.button_order = shuffled(&self.active_colors);
        self.current_challenge = Some(generate_challenge(None, &self.active_colors));
        self.round_start = None;
        self.status = GameStatus::Countdown;
    }

    /// Countdown finished: the round becomes answerable now.
    pub fn begin_playing(&mut self) {
        if self.status != GameStatus::Countdown {
            return;
        }
        self.status = GameStatus::Playing;
        self.round_start = Some(Instant::now());
    }

    /// Record the player's selection (or a timeout when `selected` is
    /// None). Only applies while playing; anything else is a stale
    /// dispatch and is ignored.
    pub fn submit_answer(&mut self, selected: Option<ColorName>, reaction_time_ms: u64) {
        if self.status != GameStatus::Playing {
            return;
        }
        let Some(challenge) = self.current_challenge else {
            return;
        };

        let outcome = match selected {
            Some(color) => classify(&challenge, color),
            None => AnswerOutcome::Timeout,
        };

        self.rounds.push(RoundResult {
            challenge,
            selected_color: selected,
            outcome,
            reaction_time_ms,
            timestamp: Local::now(),
        });

        if outcome == AnswerOutcome::Success {
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
            self.maybe_unlock_color();
        } else {
            self.current_streak = 0;
        }

        self.round_start = None;
        if self.current_round_number >= self.total_rounds {
            self.current_challenge = None;
            self.status = GameStatus::Finished;
        } else {
            // Feedback pause: the challenge stays visible so the host can
            // show what just happened; the host calls next_round() to move on.
            self.status = GameStatus::Paused;
        }
    }

    /// Advance past the feedback pause into the next round. No-op unless
    /// the current round has been answered and more rounds remain.
    pub fn next_round(&mut self) {
        if self.status != GameStatus::Paused || !self.round_answered() {
            return;
        }
        if self.current_round_number >= self.total_rounds {
            return;
        }
        let previous = self.current_challenge;
        self.current_challenge = Some(generate_challenge(
            previous.as_ref(),
            &self.active_colors,
        ));
        self.current_round_number += 1;
        self.round_start = Some(Instant::now());
        self.status = GameStatus::Playing;
    }

    /// Explicit user pause, mid-round.
    pub fn pause_game(&mut self) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.status = GameStatus::Paused;
        self.round_start = None;
    }

    /// Resume from an explicit pause. The round clock restarts from now:
    /// time spent before the pause does not count toward the reaction time
    /// of this round. Resuming from the post-answer feedback pause is a
    /// no-op (next_round is the way out of that one).
    pub fn resume_game(&mut self) {
        if self.status != GameStatus::Paused || self.round_answered() {
            return;
        }
        self.status = GameStatus::Playing;
        self.round_start = Some(Instant::now());
    }

    /// Back to idle, all counters zeroed, palette reset to base.
    pub fn reset_game(&mut self) {
        let total_rounds = self.total_rounds;
        *self = GameState::new(self.base_palette_size, self.unlocks_enabled);
        self.total_rounds = total_rounds;
    }

    /// Whether the round named by `current_round_number` already has a
    /// result. Distinguishes the feedback pause (answered) from a manual
    /// mid-round pause (not yet).
    pub fn round_answered(&self) -> bool {
        self.rounds.len() >= self.current_round_number
    }

    pub fn last_round(&self) -> Option<&RoundResult> {
        self.rounds.last()
    }

    /// Durable history for persistence, bounded to the recent window.
    pub fn snapshot(&self) -> GameSnapshot {
        let start = self.rounds.len().saturating_sub(HISTORY_WINDOW);
        GameSnapshot {
            rounds: self.rounds[start..].to_vec(),
            best_streak: self.best_streak,
        }
    }

    /// Rebuild an idle session carrying only a snapshot's durable history.
    pub fn restore(
        snapshot: GameSnapshot,
        base_palette_size: usize,
        unlocks_enabled: bool,
    ) -> Self {
        let mut state = GameState::new(base_palette_size, unlocks_enabled);
        state.best_streak = snapshot.best_streak;
        state.rounds = snapshot.rounds;
        state
    }

    /// Unlock the next bonus color when the streak hits a milestone.
    /// Idempotent: regrowing a streak back to an already-used milestone
    /// never double-adds, because only unintroduced colors qualify.
    fn maybe_unlock_color(&mut self) {
        if !self.unlocks_enabled || !UNLOCK_MILESTONES.contains(&self.current_streak) {
            return;
        }
        let next = bonus_colors(self.base_palette_size)
            .into_iter()
            .find(|c| !self.active_colors.contains(c));
        if let Some(color) = next {
            // Copy-on-write: build the grown palette rather than pushing in
            // place, so observers holding the old Vec see a stable value.
            let mut grown = self.active_colors.clone();
            grown.push(color);
            self.active_colors = grown;
            self.button_order = shuffled(&self.active_colors);
        }
    }
}

fn shuffled(colors: &[ColorName]) -> Vec<ColorName> {
    let mut order = colors.to_vec();
    order.shuffle(&mut rand::thread_rng());
    order
}
