//! Consumed-credit ledger.
//!
//! A leaky bucket run in reverse: consuming credit raises the balance, and the
//! balance drains back toward zero with a fixed half-life. The ledger does no
//! policy of its own. It never clamps to a limit; callers compare
//! [`CreditLedger::consumed`] against whatever limit they enforce.

use std::time::Duration;

use strike_core::error::{ConfigError, CreditError, SnapshotError};
use strike_core::traits::DecayCalculator;
use strike_core::types::{DecayingValue, Timestamp};
use tracing::debug;

use crate::engine::DecayEngine;

/// Decaying balance of consumed credit.
///
/// Not thread-safe; the owning account serialises access.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditLedger {
    value: DecayingValue,
    half_life: Duration,
}

impl CreditLedger {
    /// Create an empty ledger anchored at `now`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositiveHalfLife`] if `half_life` is zero.
    pub fn new(half_life: Duration, now: Timestamp) -> Result<Self, ConfigError> {
        Self::from_value(half_life, DecayingValue::zero(now))
    }

    /// Rebuild a ledger from a stored value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositiveHalfLife`] if `half_life` is zero.
    pub fn from_value(half_life: Duration, value: DecayingValue) -> Result<Self, ConfigError> {
        if half_life.is_zero() {
            return Err(ConfigError::NonPositiveHalfLife);
        }
        Ok(Self { value, half_life })
    }

    /// Rebuild a ledger from a snapshot value, rejecting negative or
    /// non-finite balances.
    pub fn restore(half_life: Duration, value: DecayingValue) -> Result<Self, SnapshotError> {
        if !value.is_valid() {
            return Err(SnapshotError::InvalidBalance(value.last_value()));
        }
        Ok(Self::from_value(half_life, value)?)
    }

    /// The fixed half-life of this ledger.
    pub fn half_life(&self) -> Duration {
        self.half_life
    }

    /// The stored (undecayed) value and its basis timestamp.
    pub fn value(&self) -> DecayingValue {
        self.value
    }

    /// Balance decayed to `as_of`. Does not mutate the ledger.
    pub fn consumed(&self, as_of: Timestamp) -> f64 {
        DecayEngine.decay(
            self.value.last_value(),
            self.half_life,
            self.value.last_updated(),
            as_of,
        )
    }

    /// Consume `amount` credit at `at` and return the new balance.
    ///
    /// The stored balance is decayed to `at` before adding. A timestamp earlier
    /// than the stored basis adds with zero elapsed decay and leaves the basis
    /// where it is.
    ///
    /// # Errors
    ///
    /// - [`CreditError::InvalidAmount`] if `amount` is negative or not finite
    /// - [`CreditError::BalanceOverflow`] if the new balance would not be
    ///   finite; the ledger is left unchanged
    pub fn consume(&mut self, amount: f64, at: Timestamp) -> Result<f64, CreditError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(CreditError::InvalidAmount(amount));
        }

        let basis = self.value.last_updated().max(at);
        let balance = DecayEngine.decay_then_add(
            self.value.last_value(),
            self.half_life,
            self.value.last_updated(),
            at,
            amount,
        );
        if !balance.is_finite() {
            return Err(CreditError::BalanceOverflow { amount });
        }
        self.value = DecayingValue::new(balance, basis);

        debug!(amount, balance, %basis, "credit_ledger: credit consumed");
        Ok(balance)
    }

    /// Fold decay up to `as_of` into the stored value.
    ///
    /// Reads stay correct without this; it only bounds floating-point drift
    /// for ledgers that go a long time between consumes. No-op unless `as_of`
    /// is after the stored basis.
    pub fn settle(&mut self, as_of: Timestamp) {
        if as_of <= self.value.last_updated() {
            return;
        }
        self.value = DecayingValue::new(self.consumed(as_of), as_of);
    }
}
