use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use stroop::game::{GameState, GameStatus};
use stroop::pace::{Pace, SpeedLevel};
use stroop::palette::BASE_PALETTE_SIZE;
use stroop::round::RoundEngine;
use stroop::runtime::{FixedTicker, Runner, StroopEvent, TestEventSource};

// Headless integration using the internal runtime + engine without a TTY.
// Key events carry the ink color of the active challenge as a digit into
// the button order, the way the binary maps keys to answers.

fn key(c: char) -> StroopEvent {
    StroopEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn button_digit(state: &GameState, correct: bool) -> char {
    let challenge = state.current_challenge.expect("active challenge");
    let target = if correct {
        challenge.ink_color
    } else {
        challenge.word
    };
    let idx = state
        .button_order
        .iter()
        .position(|c| *c == target)
        .expect("target color is on a button");
    char::from_digit(idx as u32 + 1, 10).expect("at most 9 buttons")
}

#[test]
fn headless_session_completes_via_runner() {
    let mut engine = RoundEngine::new(Duration::ZERO);
    let mut state = GameState::new(BASE_PALETTE_SIZE, true);
    engine.start_game(&mut state, 3);

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    // Drive a tiny event loop until finished (or bounded steps).
    for _ in 0..500u32 {
        match runner.step() {
            StroopEvent::Tick => {
                engine.on_tick(&mut state);
                match state.status {
                    GameStatus::Playing => {
                        // Answer correctly as soon as the round is answerable.
                        let _ = tx.send(key(button_digit(&state, true)));
                    }
                    GameStatus::Paused => {
                        let _ = tx.send(key(' '));
                    }
                    _ => {}
                }
            }
            StroopEvent::Key(k) => match k.code {
                KeyCode::Char(' ') => engine.next_round(&mut state),
                KeyCode::Char(c @ '1'..='9') => {
                    let idx = c as usize - '1' as usize;
                    if let Some(color) = state.button_order.get(idx).copied() {
                        engine.select_color(&mut state, color);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        if state.status == GameStatus::Finished {
            break;
        }
    }

    assert_eq!(state.status, GameStatus::Finished);
    assert_eq!(state.rounds.len(), 3);
    assert_eq!(state.best_streak, 3);
    assert!(state
        .rounds
        .iter()
        .all(|r| r.outcome == stroop::challenge::AnswerOutcome::Success));
}

#[test]
fn headless_timeout_round_is_autodispatched() {
    // Pin a tiny budget so the deadline can expire inside the test.
    let mut engine = RoundEngine::new(Duration::ZERO).with_fixed_pace(Pace {
        timeout_ms: 60,
        speed_level: SpeedLevel::Blitz,
    });
    let mut state = GameState::new(BASE_PALETTE_SIZE, true);
    engine.start_game(&mut state, 2);

    let (_tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

    for _ in 0..50u32 {
        if let StroopEvent::Tick = runner.step() {
            engine.on_tick(&mut state);
        }
        if !state.rounds.is_empty() {
            break;
        }
    }

    assert_eq!(state.rounds.len(), 1, "deadline expiry should answer the round");
    assert_eq!(
        state.rounds[0].outcome,
        stroop::challenge::AnswerOutcome::Timeout
    );
    assert_eq!(state.rounds[0].reaction_time_ms, 60);
    assert_eq!(state.current_streak, 0);
    assert_eq!(state.status, GameStatus::Paused);
}

#[test]
fn headless_focus_loss_suspends_the_round() {
    let mut engine = RoundEngine::new(Duration::ZERO).with_fixed_pace(Pace {
        timeout_ms: 50,
        speed_level: SpeedLevel::Blitz,
    });
    let mut state = GameState::new(BASE_PALETTE_SIZE, true);
    engine.start_game(&mut state, 2);
    engine.on_tick(&mut state);
    assert_eq!(state.status, GameStatus::Playing);

    let (tx, rx) = mpsc::channel();
    tx.send(StroopEvent::Focus(false)).unwrap();
    let es = TestEventSource::new(rx);
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

    if let StroopEvent::Focus(false) = runner.step() {
        engine.focus_lost(&mut state);
    }
    assert_eq!(state.status, GameStatus::Paused);

    // Wait past the old budget; nothing may fire while backgrounded.
    std::thread::sleep(Duration::from_millis(80));
    engine.on_tick(&mut state);
    assert!(state.rounds.is_empty());

    // Resuming restarts the reaction clock and a fresh deadline.
    engine.resume(&mut state);
    assert_eq!(state.status, GameStatus::Playing);
    assert!(engine.time_remaining_ms() > 0);
}

#[test]
fn headless_focus_loss_during_countdown_cancels_the_session() {
    let mut engine = RoundEngine::new(Duration::from_millis(30)).with_fixed_pace(Pace {
        timeout_ms: 40,
        speed_level: SpeedLevel::Blitz,
    });
    let mut state = GameState::new(BASE_PALETTE_SIZE, true);
    engine.start_game(&mut state, 2);
    assert_eq!(state.status, GameStatus::Countdown);

    let (tx, rx) = mpsc::channel();
    tx.send(StroopEvent::Focus(false)).unwrap();
    let es = TestEventSource::new(rx);
    let runner = Runner::new(es, FixedTicker::new(Duration::from_millis(10)));

    if let StroopEvent::Focus(false) = runner.step() {
        engine.focus_lost(&mut state);
    }
    assert_eq!(state.status, GameStatus::Idle);

    // Wait past the countdown and the round budget; the session must not
    // start, let alone resolve a round, while backgrounded.
    std::thread::sleep(Duration::from_millis(90));
    engine.on_tick(&mut state);
    assert_eq!(state.status, GameStatus::Idle);
    assert!(state.rounds.is_empty());
}
