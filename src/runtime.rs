use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner.
#[derive(Clone, Debug)]
pub enum StroopEvent {
    Key(KeyEvent),
    Resize,
    /// Terminal focus changed; `true` means focus gained. Focus loss must
    /// suspend the reaction clock, so it travels the same channel as keys.
    Focus(bool),
    Tick,
}

/// Source of terminal events (keyboard, resize, focus).
pub trait StroopEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<StroopEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<StroopEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => Some(StroopEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => Some(StroopEvent::Resize),
                Ok(CtEvent::FocusGained) => Some(StroopEvent::Focus(true)),
                Ok(CtEvent::FocusLost) => Some(StroopEvent::Focus(false)),
                Ok(_) => None,
                Err(_) => break,
            };
            if let Some(ev) = forwarded {
                if tx.send(ev).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StroopEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<StroopEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<StroopEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<StroopEvent>) -> Self {
        Self { rx }
    }
}

impl StroopEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<StroopEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: StroopEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: StroopEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> StroopEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                StroopEvent::Tick
            }
        }
    }
}
