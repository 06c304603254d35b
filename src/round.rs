use crate::game::{GameState, GameStatus};
use crate::pace::{pace_for_streak, Pace};
use crate::palette::ColorName;
use crate::timer::ReactionTimer;
use std::time::{Duration, Instant};

/// Binds the reaction timer, the pace table, and the game state machine
/// into the per-round protocol: countdown, arm the deadline, await input
/// or expiry, classify, feedback pause, advance.
///
/// The deadline is an armed [`Instant`] checked on the tick cadence;
/// cancelling means disarming it. Exactly one of {player answer, deadline
/// expiry} resolves a round: both paths disarm the deadline before they
/// touch the state machine, and the state machine's not-playing guard
/// absorbs whatever slips through anyway.
#[derive(Debug)]
pub struct RoundEngine {
    timer: ReactionTimer,
    pace: Pace,
    deadline: Option<Instant>,
    countdown_until: Option<Instant>,
    countdown: Duration,
    fixed_pace: Option<Pace>,
}

impl RoundEngine {
    pub fn new(countdown: Duration) -> Self {
        Self {
            timer: ReactionTimer::new(),
            pace: pace_for_streak(0),
            deadline: None,
            countdown_until: None,
            countdown,
            fixed_pace: None,
        }
    }

    /// Pin every round to one budget instead of the streak-derived table.
    /// Used by headless tests and demos that cannot wait out real budgets.
    pub fn with_fixed_pace(mut self, pace: Pace) -> Self {
        self.fixed_pace = Some(pace);
        self
    }

    pub fn start_game(&mut self, state: &mut GameState, total_rounds: usize) {
        self.disarm();
        self.timer.reset();
        state.start_game(total_rounds);
        self.countdown_until = Some(Instant::now() + self.countdown);
    }

    /// Tick cadence entry point: flips countdown -> playing when the delay
    /// passes, refreshes the display clock, and resolves an expired
    /// deadline as a timeout answer.
    pub fn on_tick(&mut self, state: &mut GameState) {
        let now = Instant::now();

        if let Some(until) = self.countdown_until {
            if now >= until {
                self.countdown_until = None;
                state.begin_playing();
                if state.status == GameStatus::Playing {
                    self.arm_round(state);
                }
            }
        }

        self.timer.on_tick();

        if let Some(deadline) = self.deadline {
            if state.status == GameStatus::Playing && now >= deadline {
                self.deadline = None;
                self.timer.stop();
                state.submit_answer(None, self.pace.timeout_ms);
            }
        }
    }

    /// Player picked a color: cancel the pending deadline, read the
    /// reaction time, and hand both to the state machine. Ignored outside
    /// an answerable round.
    pub fn select_color(&mut self, state: &mut GameState, color: ColorName) {
        if state.status != GameStatus::Playing {
            return;
        }
        self.deadline = None;
        let reaction_ms = self.timer.elapsed_ms();
        self.timer.stop();
        state.submit_answer(Some(color), reaction_ms);
    }

    /// Leave the feedback pause and arm the next round.
    pub fn next_round(&mut self, state: &mut GameState) {
        let before = state.current_round_number;
        state.next_round();
        if state.current_round_number > before {
            self.arm_round(state);
        }
    }

    pub fn pause(&mut self, state: &mut GameState) {
        if state.status != GameStatus::Playing {
            return;
        }
        self.disarm();
        self.timer.stop();
        state.pause_game();
    }

    /// Resume from a manual pause. The reaction clock and the deadline both
    /// restart from now; time spent before the pause is forfeit.
    pub fn resume(&mut self, state: &mut GameState) {
        let was_paused = state.status == GameStatus::Paused;
        state.resume_game();
        if was_paused && state.status == GameStatus::Playing {
            self.arm_round(state);
        }
    }

    pub fn reset(&mut self, state: &mut GameState) {
        self.disarm();
        self.timer.reset();
        state.reset_game();
    }

    /// Terminal went to the background: measured time from here on would be
    /// inflated, so suspend the clock and force a pause. The player resumes
    /// explicitly once they are back.
    pub fn focus_lost(&mut self, state: &mut GameState) {
        self.timer.suspend();
        match state.status {
            GameStatus::Playing => {
                self.disarm();
                state.pause_game();
            }
            // A backgrounded countdown must not roll into a live round.
            // Nothing has happened yet, so drop back to the start screen.
            GameStatus::Countdown => {
                self.disarm();
                state.reset_game();
            }
            _ => {}
        }
    }

    pub fn pace(&self) -> Pace {
        self.pace
    }

    /// Live reaction clock for display, refreshed on the tick cadence.
    pub fn elapsed_ms(&self) -> u64 {
        self.timer.display_ms()
    }

    /// Milliseconds left on the armed deadline; 0 once disarmed or expired.
    pub fn time_remaining_ms(&self) -> u64 {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_millis() as u64)
            .unwrap_or(0)
    }

    /// Milliseconds left on the pre-game countdown, if one is running.
    pub fn countdown_remaining_ms(&self) -> Option<u64> {
        self.countdown_until
            .map(|u| u.saturating_duration_since(Instant::now()).as_millis() as u64)
    }

    fn arm_round(&mut self, state: &GameState) {
        self.pace = self
            .fixed_pace
            .unwrap_or_else(|| pace_for_streak(state.current_streak));
        self.timer.reset();
        self.timer.start();
        self.deadline = Some(Instant::now() + Duration::from_millis(self.pace.timeout_ms));
    }

    fn disarm(&mut self) {
        self.deadline = None;
        self.countdown_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::AnswerOutcome;
    use crate::pace::SpeedLevel;
    use crate::palette::BASE_PALETTE_SIZE;
    use std::thread;

    fn quick_pace(ms: u64) -> Pace {
        Pace {
            timeout_ms: ms,
            speed_level: SpeedLevel::Blitz,
        }
    }

    fn started(engine: &mut RoundEngine, total_rounds: usize) -> GameState {
        let mut state = GameState::new(BASE_PALETTE_SIZE, true);
        engine.start_game(&mut state, total_rounds);
        engine.on_tick(&mut state);
        state
    }

    #[test]
    fn test_countdown_elapses_into_playing() {
        let mut engine = RoundEngine::new(Duration::from_millis(30));
        let mut state = GameState::new(BASE_PALETTE_SIZE, true);
        engine.start_game(&mut state, 3);

        engine.on_tick(&mut state);
        assert_eq!(state.status, GameStatus::Countdown);
        assert!(engine.countdown_remaining_ms().is_some());

        thread::sleep(Duration::from_millis(40));
        engine.on_tick(&mut state);
        assert_eq!(state.status, GameStatus::Playing);
        assert!(state.round_start.is_some());
        assert!(engine.countdown_remaining_ms().is_none());
        assert!(engine.time_remaining_ms() > 0);
    }

    #[test]
    fn test_selection_resolves_the_round_and_disarms_deadline() {
        let mut engine = RoundEngine::new(Duration::ZERO);
        let mut state = started(&mut engine, 3);
        assert_eq!(state.status, GameStatus::Playing);

        let ink = state.current_challenge.unwrap().ink_color;
        engine.select_color(&mut state, ink);

        assert_eq!(state.status, GameStatus::Paused);
        assert_eq!(state.rounds.len(), 1);
        assert_eq!(state.rounds[0].outcome, AnswerOutcome::Success);
        assert_eq!(engine.time_remaining_ms(), 0);

        // A deadline expiry racing in afterwards must change nothing.
        thread::sleep(Duration::from_millis(10));
        engine.on_tick(&mut state);
        assert_eq!(state.rounds.len(), 1);
        assert_eq!(state.status, GameStatus::Paused);
    }

    #[test]
    fn test_deadline_expiry_forces_timeout_outcome() {
        let mut engine =
            RoundEngine::new(Duration::ZERO).with_fixed_pace(quick_pace(40));
        let mut state = started(&mut engine, 3);

        thread::sleep(Duration::from_millis(60));
        engine.on_tick(&mut state);

        assert_eq!(state.rounds.len(), 1);
        assert_eq!(state.rounds[0].outcome, AnswerOutcome::Timeout);
        assert_eq!(state.rounds[0].selected_color, None);
        assert_eq!(state.rounds[0].reaction_time_ms, 40);
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.status, GameStatus::Paused);
    }

    #[test]
    fn test_timeout_fires_once_even_across_more_ticks() {
        let mut engine =
            RoundEngine::new(Duration::ZERO).with_fixed_pace(quick_pace(30));
        let mut state = started(&mut engine, 3);

        thread::sleep(Duration::from_millis(50));
        engine.on_tick(&mut state);
        engine.on_tick(&mut state);
        engine.on_tick(&mut state);

        assert_eq!(state.rounds.len(), 1);
    }

    #[test]
    fn test_next_round_rearms_a_fresh_deadline() {
        let mut engine = RoundEngine::new(Duration::ZERO);
        let mut state = started(&mut engine, 3);

        let ink = state.current_challenge.unwrap().ink_color;
        engine.select_color(&mut state, ink);
        engine.next_round(&mut state);

        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.current_round_number, 2);
        assert!(engine.time_remaining_ms() > 0);
    }

    #[test]
    fn test_pause_disarms_and_resume_rearms() {
        let mut engine =
            RoundEngine::new(Duration::ZERO).with_fixed_pace(quick_pace(50));
        let mut state = started(&mut engine, 3);

        engine.pause(&mut state);
        assert_eq!(state.status, GameStatus::Paused);
        assert_eq!(engine.time_remaining_ms(), 0);

        // A paused deadline can never fire.
        thread::sleep(Duration::from_millis(70));
        engine.on_tick(&mut state);
        assert!(state.rounds.is_empty());

        engine.resume(&mut state);
        assert_eq!(state.status, GameStatus::Playing);
        assert!(engine.time_remaining_ms() > 0);
    }

    #[test]
    fn test_resume_does_not_rearm_feedback_pause() {
        let mut engine = RoundEngine::new(Duration::ZERO);
        let mut state = started(&mut engine, 3);

        let ink = state.current_challenge.unwrap().ink_color;
        engine.select_color(&mut state, ink);
        engine.resume(&mut state);

        assert_eq!(state.status, GameStatus::Paused);
        assert_eq!(engine.time_remaining_ms(), 0);
    }

    #[test]
    fn test_focus_loss_pauses_an_active_round() {
        let mut engine =
            RoundEngine::new(Duration::ZERO).with_fixed_pace(quick_pace(50));
        let mut state = started(&mut engine, 3);

        engine.focus_lost(&mut state);
        assert_eq!(state.status, GameStatus::Paused);
        assert_eq!(engine.time_remaining_ms(), 0);

        thread::sleep(Duration::from_millis(70));
        engine.on_tick(&mut state);
        assert!(state.rounds.is_empty(), "no timeout may fire while backgrounded");
    }

    #[test]
    fn test_focus_loss_during_countdown_cancels_the_session() {
        let mut engine =
            RoundEngine::new(Duration::from_millis(30)).with_fixed_pace(quick_pace(40));
        let mut state = GameState::new(BASE_PALETTE_SIZE, true);
        engine.start_game(&mut state, 3);
        assert_eq!(state.status, GameStatus::Countdown);

        engine.focus_lost(&mut state);
        assert_eq!(state.status, GameStatus::Idle);
        assert!(engine.countdown_remaining_ms().is_none());

        // Tick past both the countdown and the round budget.
        thread::sleep(Duration::from_millis(80));
        engine.on_tick(&mut state);
        assert_eq!(state.status, GameStatus::Idle);
        assert!(
            state.rounds.is_empty(),
            "no round may resolve while backgrounded"
        );
    }

    #[test]
    fn test_reset_cancels_everything() {
        let mut engine = RoundEngine::new(Duration::from_millis(200));
        let mut state = GameState::new(BASE_PALETTE_SIZE, true);
        engine.start_game(&mut state, 3);
        engine.reset(&mut state);

        assert_eq!(state.status, GameStatus::Idle);
        assert!(engine.countdown_remaining_ms().is_none());
        assert_eq!(engine.time_remaining_ms(), 0);
        assert_eq!(engine.elapsed_ms(), 0);

        thread::sleep(Duration::from_millis(220));
        engine.on_tick(&mut state);
        assert_eq!(state.status, GameStatus::Idle, "stale countdown must not fire");
    }
}
