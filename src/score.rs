//! Scoring and leveling
//!
//! Every cleared row scores `SCORE_BASE * multiplier * level`, where the
//! multiplier grows with the row's position in a multi-row clear.

use crate::storage::Storage;
use tracing::{info, warn};

/// Points for a single row at level 1
pub const SCORE_BASE: u64 = 40;
/// Combo multipliers in tenths: 1, 2.5, 7.5, 30
const COMBO_MULTIPLIERS: [u64; 4] = [10, 25, 75, 300];

/// Highest level; levels run `0..MAX_LEVEL` at selection time
pub const MAX_LEVEL: u32 = 18;
/// Fall interval at level 0
pub const BASE_INTERVAL_MS: u64 = 475;
/// Fall interval reduction per level
pub const INTERVAL_STEP_MS: u64 = 25;

/// Storage key for the persisted high score
pub const HIGH_SCORE_KEY: &str = "high_score";

/// Score tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Score {
    /// Current score
    pub points: u64,
    /// Best score across sessions
    pub high_score: u64,
    /// Total rows cleared this game
    pub cleared_rows: u32,
}

impl Score {
    /// Start with the high score found in storage
    pub fn load(storage: &dyn Storage) -> Self {
        let high_score = match storage.get(HIGH_SCORE_KEY) {
            None => 0,
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring malformed stored high score {:?}", value);
                0
            }),
        };
        Self {
            high_score,
            ..Self::default()
        }
    }

    /// Multiplier (in tenths) for the `combo`-th row of one clear
    fn multiplier(combo: usize) -> u64 {
        COMBO_MULTIPLIERS.get(combo).copied().unwrap_or(10)
    }

    /// Add the score for one cleared row.
    /// `combo` is the 0-based index of this row among the rows cleared by the same lock.
    /// Level 0 always scores nothing.
    pub fn add(&mut self, level: u32, combo: usize) {
        self.points += SCORE_BASE * Self::multiplier(combo) * level as u64 / 10;
    }

    /// Count one cleared row towards the leveling total
    pub fn add_cleared_row(&mut self) {
        self.cleared_rows += 1;
    }

    /// Record a new high score if this game beat it. Returns true when it did.
    /// A failed write is logged; the in-memory high score is still updated.
    pub fn update_high_score(&mut self, storage: &mut dyn Storage) -> bool {
        if self.points <= self.high_score {
            return false;
        }
        self.high_score = self.points;
        info!("New high score {}", self.points);
        if let Err(e) = storage.set(HIGH_SCORE_KEY, &self.points.to_string()) {
            warn!("Could not persist high score: {}", e);
        }
        true
    }

    /// Reset for a new game, keeping the high score
    pub fn restart(&mut self) {
        self.points = 0;
        self.cleared_rows = 0;
    }
}

/// Level and the fall speed derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    /// Current level
    pub level: u32,
    /// Level the game started at
    pub initial: u32,
    /// Rows that must be cleared per level gained
    pub rows_per_level: u32,
}

impl Level {
    /// Start at `level`, clamped into the selectable range
    pub fn new(level: u32, rows_per_level: u32) -> Self {
        let level = level.min(MAX_LEVEL - 1);
        Self {
            level,
            initial: level,
            rows_per_level: rows_per_level.max(1),
        }
    }

    /// Milliseconds between gravity steps at the current level
    pub fn fall_interval_ms(&self) -> u64 {
        BASE_INTERVAL_MS.saturating_sub(self.level as u64 * INTERVAL_STEP_MS)
    }

    /// Whether enough rows have been cleared to gain a level
    pub fn should_increase(&self, cleared_rows: u32) -> bool {
        self.level < MAX_LEVEL && cleared_rows / self.rows_per_level > self.level - self.initial
    }

    /// Gain at most one level. Returns true when the level changed.
    pub fn update(&mut self, cleared_rows: u32) -> bool {
        if !self.should_increase(cleared_rows) {
            return false;
        }
        self.level += 1;
        info!(
            "Level up to {} ({} ms per row)",
            self.level,
            self.fall_interval_ms()
        );
        true
    }
}
