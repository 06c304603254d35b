use std::time::Instant;

/// Monotonic stopwatch for reaction timing.
///
/// `start` is idempotent: only the first call after a `reset` records the
/// origin. `stop` freezes the tick-refreshed display value but keeps the
/// origin, so [`ReactionTimer::elapsed_ms`] still measures against the
/// original start moment until `reset` clears it. Built on
/// [`Instant`] so system clock adjustments cannot skew measurements.
#[derive(Debug, Default)]
pub struct ReactionTimer {
    started_at: Option<Instant>,
    running: bool,
    display_ms: u64,
}

impl ReactionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Halt measurement because the host lost focus. Reaction times taken
    /// while the terminal is backgrounded would be garbage, so the round
    /// driver resets the clock on the way back in rather than resuming it.
    pub fn suspend(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.running = false;
        self.display_ms = 0;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Milliseconds since the recorded origin. Side-effect free; returns 0
    /// before the first `start`.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Refresh the display value. Call on the tick cadence; a stopped timer
    /// keeps showing the value it froze at.
    pub fn on_tick(&mut self) {
        if self.running {
            self.display_ms = self.elapsed_ms();
        }
    }

    /// Last tick-refreshed elapsed value, for rendering without forcing a
    /// fresh clock read.
    pub fn display_ms(&self) -> u64 {
        self.display_ms
    }
}
