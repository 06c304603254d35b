use crate::palette::{random_color, ColorName};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CHALLENGE_ID: AtomicU64 = AtomicU64::new(1);

/// One Stroop trial: a color word rendered in a conflicting ink color.
///
/// Invariant: `word != ink_color`, guaranteed by construction in
/// [`generate_challenge`]. Immutable once created; lives for exactly one
/// round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StroopChallenge {
    pub id: u64,
    pub word: ColorName,
    pub ink_color: ColorName,
    pub created_at: DateTime<Local>,
}

/// How a round ended.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnswerOutcome {
    /// Picked the ink color.
    Success,
    /// Read the word instead of perceiving the ink, the classic Stroop failure.
    ImpulseError,
    /// Picked a color that was neither the word nor the ink.
    WrongChoice,
    /// The round's time budget elapsed with no selection.
    Timeout,
}

impl std::str::FromStr for AnswerOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AnswerOutcome::Success),
            "impulse_error" => Ok(AnswerOutcome::ImpulseError),
            "wrong_choice" => Ok(AnswerOutcome::WrongChoice),
            "timeout" => Ok(AnswerOutcome::Timeout),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

/// Produce the next trial from the currently unlocked colors.
///
/// The word is drawn excluding the previous round's word (no immediate
/// repeats), and the ink is drawn excluding the word, so the conflict
/// invariant holds without retry loops.
///
/// Panics if `pool` has fewer than 2 colors; that signals a bug in
/// unlock-pool management, not a runtime condition.
pub fn generate_challenge(
    previous: Option<&StroopChallenge>,
    pool: &[ColorName],
) -> StroopChallenge {
    let word = random_color(pool, previous.map(|p| p.word));
    let ink_color = random_color(pool, Some(word));

    StroopChallenge {
        id: NEXT_CHALLENGE_ID.fetch_add(1, Ordering::Relaxed),
        word,
        ink_color,
        created_at: Local::now(),
    }
}

/// Classify a selection against a challenge. Pure; a missing selection is
/// the caller's business (it reports [`AnswerOutcome::Timeout`] itself).
pub fn classify(challenge: &StroopChallenge, selected: ColorName) -> AnswerOutcome {
    if selected == challenge.ink_color {
        AnswerOutcome::Success
    } else if selected == challenge.word {
        AnswerOutcome::ImpulseError
    } else {
        AnswerOutcome::WrongChoice
    }
}
