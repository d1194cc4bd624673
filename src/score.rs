//! Points awarded for a correct answer.
//!
//! The speed bonus combines the client-reported elapsed time with the
//! server's own clock and deadline. The client's absolute clock is never
//! consulted, but a client that under-reports its elapsed time still
//! inflates its bonus; that is a known limitation of this scheme. Stricter
//! schemes (server timestamps only) can implement [`ScoreCalculator`]
//! without touching the engine.

use crate::types::ScoringConfig;
use std::time::Duration;

/// Default size of one bonus unit
pub const DEFAULT_BONUS_GRANULARITY: Duration = Duration::from_millis(100);

pub trait ScoreCalculator: Send + Sync {
    /// Points for a correct answer accepted at `now_ms`
    fn score(&self, scoring: &ScoringConfig, elapsed_ms: u64, deadline_ms: i64, now_ms: i64)
        -> u32;
}

/// Time left before the deadline at the moment the client says it answered.
///
/// `max(0, deadline - (now - elapsed))`
pub fn remaining_ms(elapsed_ms: u64, deadline_ms: i64, now_ms: i64) -> u64 {
    let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
    let sent_at = now_ms.saturating_sub(elapsed);
    let remaining = deadline_ms.saturating_sub(sent_at);
    u64::try_from(remaining).unwrap_or(0)
}

/// `base + floor(remaining / granularity) * multiplier`, saturating
pub fn points_for_remaining(
    base_points: u32,
    multiplier: u32,
    remaining_ms: u64,
    granularity_ms: u64,
) -> u32 {
    if granularity_ms == 0 {
        return base_points;
    }
    let units = remaining_ms / granularity_ms;
    let bonus = units.saturating_mul(u64::from(multiplier));
    base_points.saturating_add(u32::try_from(bonus).unwrap_or(u32::MAX))
}

/// Unclamped score: the formula exactly as clients are told it works
pub fn calculate_score(
    base_points: u32,
    multiplier: u32,
    elapsed_ms: u64,
    deadline_ms: i64,
    now_ms: i64,
    granularity_ms: u64,
) -> u32 {
    points_for_remaining(
        base_points,
        multiplier,
        remaining_ms(elapsed_ms, deadline_ms, now_ms),
        granularity_ms,
    )
}

/// Linear speed bonus, with `remaining` capped at the answer window
#[derive(Debug, Clone, Copy)]
pub struct SpeedBonus {
    pub granularity: Duration,
    pub window: Duration,
}

impl SpeedBonus {
    pub fn new(granularity: Duration, window: Duration) -> Self {
        Self {
            granularity,
            window,
        }
    }
}

impl ScoreCalculator for SpeedBonus {
    fn score(
        &self,
        scoring: &ScoringConfig,
        elapsed_ms: u64,
        deadline_ms: i64,
        now_ms: i64,
    ) -> u32 {
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        let granularity_ms = u64::try_from(self.granularity.as_millis()).unwrap_or(u64::MAX);
        let points = calculate_score(
            scoring.base_points,
            scoring.speed_bonus_multiplier,
            elapsed_ms,
            deadline_ms,
            now_ms,
            granularity_ms,
        );
        // Never more than a full-window bonus
        points.min(points_for_remaining(
            scoring.base_points,
            scoring.speed_bonus_multiplier,
            window_ms,
            granularity_ms,
        ))
    }
}
