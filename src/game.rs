#![warn(clippy::all, clippy::pedantic)]

// Game board dimensions
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

// Line clear scoring, indexed by rows cleared in one lock (max 4), multiplied
// by the current level.
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

// Manual descent scoring, per row
pub const SOFT_DROP_POINTS: u32 = 1;
pub const HARD_DROP_POINTS: u32 = 2;

// Level progression
pub const LINES_PER_LEVEL: u32 = 10;
pub const STARTING_LEVEL: u32 = 1;

// Gravity timing
pub const BASE_DROP_INTERVAL_MS: u32 = 1000;
pub const DROP_INTERVAL_STEP_MS: u32 = 100;
pub const MIN_DROP_INTERVAL_MS: u32 = 50;

/// Milliseconds between automatic one-row descents at `level`. Decreases by
/// one step per level, floored at the minimum.
#[must_use]
pub fn drop_interval_ms(level: u32) -> u32 {
    BASE_DROP_INTERVAL_MS
        .saturating_sub(level.saturating_sub(1).saturating_mul(DROP_INTERVAL_STEP_MS))
        .max(MIN_DROP_INTERVAL_MS)
}
