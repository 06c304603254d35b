use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Closed registry of every color the game can ever show.
///
/// The first [`BASE_PALETTE_SIZE`] entries of [`ALL_COLORS`] are in play from
/// round one; the rest are earned through streak milestones (see
/// `game::UNLOCK_MILESTONES`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorName {
    Red,
    Blue,
    Green,
    Yellow,
    White,
    Purple,
    Orange,
    Pink,
    Cyan,
}

pub const ALL_COLORS: [ColorName; 9] = [
    ColorName::Red,
    ColorName::Blue,
    ColorName::Green,
    ColorName::Yellow,
    ColorName::White,
    ColorName::Purple,
    ColorName::Orange,
    ColorName::Pink,
    ColorName::Cyan,
];

/// How many of [`ALL_COLORS`] are active when a session starts.
pub const BASE_PALETTE_SIZE: usize = 5;

impl ColorName {
    /// Uppercase word as shown to the player.
    pub fn label(&self) -> &'static str {
        match self {
            ColorName::Red => "RED",
            ColorName::Blue => "BLUE",
            ColorName::Green => "GREEN",
            ColorName::Yellow => "YELLOW",
            ColorName::White => "WHITE",
            ColorName::Purple => "PURPLE",
            ColorName::Orange => "ORANGE",
            ColorName::Pink => "PINK",
            ColorName::Cyan => "CYAN",
        }
    }

    pub fn parse(s: &str) -> Option<ColorName> {
        ALL_COLORS
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(s))
    }
}

/// The palette every session starts with.
pub fn base_palette(size: usize) -> Vec<ColorName> {
    let size = size.clamp(2, ALL_COLORS.len());
    ALL_COLORS[..size].to_vec()
}

/// Colors not in the base palette, in unlock order.
pub fn bonus_colors(base_size: usize) -> Vec<ColorName> {
    let base_size = base_size.clamp(2, ALL_COLORS.len());
    ALL_COLORS[base_size..].to_vec()
}

/// Uniform draw from `pool`, never returning `exclude`.
///
/// Panics if the draw is impossible. That is a caller bug: unlock-pool
/// management must keep at least two colors in play at all times.
pub fn random_color(pool: &[ColorName], exclude: Option<ColorName>) -> ColorName {
    assert!(
        pool.len() >= 2,
        "color pool must hold at least 2 colors, got {}",
        pool.len()
    );

    let candidates: Vec<ColorName> = pool
        .iter()
        .copied()
        .filter(|c| Some(*c) != exclude)
        .collect();

    assert!(!candidates.is_empty(), "exclusion emptied the color pool");

    *candidates
        .choose(&mut rand::thread_rng())
        .expect("non-empty candidate pool")
}
