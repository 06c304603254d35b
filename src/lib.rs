// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
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
pub mod util;

/// Display-refresh cadence. The armed deadline is authoritative; ticks only
/// refresh the live clock and resolve expiries.
pub const TICK_RATE_MS: u64 = 50;
