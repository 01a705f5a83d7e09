//! Decay engine implementing the [`DecayCalculator`] trait.
//!
//! Half-life decay in `f64`: `value * 2^(-elapsed / half_life)`.
//! Elapsed time is computed with saturating subtraction, so a timestamp from
//! before the stored basis decays by nothing rather than growing the value.

use std::time::Duration;

use strike_core::traits::DecayCalculator;
use strike_core::types::Timestamp;
use tracing::trace;

/// The production half-life decay calculator.
///
/// Stateless; a single instance can be shared by every ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecayEngine;

impl DecayEngine {
    /// Create a new DecayEngine.
    pub fn new() -> Self {
        Self
    }

    /// Number of half-lives between `last_updated` and `now` (zero when `now`
    /// is not after `last_updated`).
    ///
    /// A zero `half_life` yields `f64::INFINITY` for any positive elapsed time.
    pub fn half_lives_elapsed(half_life: Duration, last_updated: Timestamp, now: Timestamp) -> f64 {
        let elapsed = now.saturating_elapsed_since(last_updated);
        if elapsed.is_zero() {
            return 0.0;
        }
        if half_life.is_zero() {
            return f64::INFINITY;
        }
        elapsed.as_secs_f64() / half_life.as_secs_f64()
    }
}

impl DecayCalculator for DecayEngine {
    fn decay(
        &self,
        last_value: f64,
        half_life: Duration,
        last_updated: Timestamp,
        now: Timestamp,
    ) -> f64 {
        // f64::max discards NaN.
        let value = last_value.max(0.0);

        if now < last_updated {
            trace!(
                %now,
                %last_updated,
                "decay: timestamp precedes basis, clamping elapsed to zero"
            );
            return value;
        }
        if value == 0.0 {
            return 0.0;
        }

        let half_lives = Self::half_lives_elapsed(half_life, last_updated, now);
        if half_lives == 0.0 {
            return value;
        }
        if half_lives.is_infinite() {
            return 0.0;
        }

        value * (-half_lives).exp2()
    }
}
