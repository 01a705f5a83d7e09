//! Trait interfaces for the Strike engine.
//!
//! These traits define the contracts between crates and collaborators:
//! - [`DecayCalculator`] — half-life decay math (strike-decay implements)
//! - [`AccountStore`] — load/save boundary to external persistence

use std::time::Duration;

use crate::error::StoreError;
use crate::types::{AccountIdentity, AccountSnapshot, Timestamp};

/// Pure computation of exponentially decaying values.
///
/// Implementations must be deterministic and side-effect free. Time running
/// backwards (`now < last_updated`) is treated as zero elapsed time so a
/// skewed clock can never amplify a value.
pub trait DecayCalculator: Send + Sync {
    /// Value of `last_value` after decaying from `last_updated` to `now`.
    ///
    /// `last_value * 2^(-elapsed / half_life)`.
    fn decay(
        &self,
        last_value: f64,
        half_life: Duration,
        last_updated: Timestamp,
        now: Timestamp,
    ) -> f64;

    /// Decay to `now`, then add `delta`, in one step.
    ///
    /// Default implementation: `decay(...) + delta`, floored at zero.
    fn decay_then_add(
        &self,
        last_value: f64,
        half_life: Duration,
        last_updated: Timestamp,
        now: Timestamp,
        delta: f64,
    ) -> f64 {
        (self.decay(last_value, half_life, last_updated, now) + delta).max(0.0)
    }
}

/// Persistence collaborator for account state.
///
/// The engine calls [`load`](Self::load) before first use of an account and
/// [`save`](Self::save) whenever the owner decides to commit (after each
/// mutation, or batched). How and where snapshots are stored is entirely up
/// to the implementation.
pub trait AccountStore: Send + Sync {
    /// Fetch the most recently saved snapshot, or `None` for unknown accounts.
    fn load(&self, identity: &AccountIdentity) -> Result<Option<AccountSnapshot>, StoreError>;

    /// Store a snapshot, replacing any previous one for the same identity.
    fn save(&self, snapshot: &AccountSnapshot) -> Result<(), StoreError>;

    /// Whether a snapshot exists for `identity`.
    ///
    /// Default implementation delegates to [`load`](Self::load).
    fn contains(&self, identity: &AccountIdentity) -> Result<bool, StoreError> {
        Ok(self.load(identity)?.is_some())
    }
}
