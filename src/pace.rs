/// Named difficulty tier shown next to the countdown gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum SpeedLevel {
    Warmup,
    Steady,
    Quick,
    Rapid,
    Blitz,
}

/// Per-round time budget derived from the current streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pace {
    pub timeout_ms: u64,
    pub speed_level: SpeedLevel,
}

/// Streak threshold -> (budget, tier). Ordered by threshold; budgets must
/// be non-increasing. The last entry is the floor.
const PACE_TIERS: [(u32, u64, SpeedLevel); 5] = [
    (0, 3000, SpeedLevel::Warmup),
    (3, 2500, SpeedLevel::Steady),
    (6, 2000, SpeedLevel::Quick),
    (10, 1500, SpeedLevel::Rapid),
    (15, 1000, SpeedLevel::Blitz),
];

/// Never hand out less than this, no matter how long the streak runs.
pub const MIN_TIMEOUT_MS: u64 = 1000;

/// Look up the time budget for the current streak.
pub fn pace_for_streak(streak: u32) -> Pace {
    let (_, timeout_ms, speed_level) = PACE_TIERS
        .iter()
        .rev()
        .find(|(threshold, _, _)| streak >= *threshold)
        .copied()
        .unwrap_or(PACE_TIERS[0]);

    Pace {
        timeout_ms: timeout_ms.max(MIN_TIMEOUT_MS),
        speed_level,
    }
}
