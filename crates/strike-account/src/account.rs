//! Account-level abuse state.
//!
//! [`AccountState`] composes one [`CreditLedger`] and two [`RecencySet`]s
//! (devices that logged in successfully, and password hashes that failed)
//! with the account's fixed configuration. It is a plain in-memory record;
//! loading and saving go through [`AccountSnapshot`].
//!
//! Not thread-safe. Wrap in [`SharedAccount`](crate::SharedAccount) when
//! several workers touch the same account.

use std::time::Duration;

use strike_core::error::{ConfigError, CreditError, RecencyKind, SnapshotError};
use strike_core::types::{
    AccountIdentity, AccountSnapshot, DeviceHash, PasswordHash, StoredCredential, Timestamp,
};
use strike_decay::CreditLedger;
use tracing::{debug, info};

use crate::config::AccountConfig;
use crate::recency::RecencySet;

/// Live abuse-signal record for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountState {
    identity: AccountIdentity,
    credential: StoredCredential,
    credit_limit: f64,
    created_at: Timestamp,
    consumed_credit: CreditLedger,
    successful_devices: RecencySet<DeviceHash>,
    incorrect_passwords: RecencySet<PasswordHash>,
}

impl AccountState {
    /// Create the state for a new account at `now`, with zero consumed credit.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyIdentity`] if `identity` is empty
    /// - any error from [`AccountConfig::validate`]
    pub fn initialize(
        identity: impl Into<String>,
        credential: StoredCredential,
        config: &AccountConfig,
        now: Timestamp,
    ) -> Result<Self, ConfigError> {
        let identity = AccountIdentity::new(identity)?;
        config.validate()?;

        let state = Self {
            identity,
            credential,
            credit_limit: config.credit_limit,
            created_at: now,
            consumed_credit: CreditLedger::new(config.credit_half_life, now)?,
            successful_devices: RecencySet::new(
                RecencyKind::SuccessfulDevices,
                config.device_capacity,
            )?,
            incorrect_passwords: RecencySet::new(
                RecencyKind::IncorrectPasswords,
                config.incorrect_password_capacity,
            )?,
        };

        info!(account = %state.identity, created_at = %now, "account: initialized");
        Ok(state)
    }

    /// Rebuild state from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// [`SnapshotError`] if the snapshot violates any invariant (zero
    /// half-life or capacity, negative balance, oversized recency set,
    /// invalid credit limit).
    pub fn restore(snapshot: AccountSnapshot) -> Result<Self, SnapshotError> {
        let AccountSnapshot {
            identity,
            credential,
            credit_limit,
            credit_half_life,
            created_at,
            consumed_credit,
            device_capacity,
            successful_devices,
            incorrect_password_capacity,
            incorrect_passwords,
        } = snapshot;

        if !credit_limit.is_finite() || credit_limit < 0.0 {
            return Err(ConfigError::InvalidCreditLimit(credit_limit).into());
        }

        Ok(Self {
            identity,
            credential,
            credit_limit,
            created_at,
            consumed_credit: CreditLedger::restore(credit_half_life, consumed_credit)?,
            successful_devices: RecencySet::from_entries(
                RecencyKind::SuccessfulDevices,
                device_capacity,
                successful_devices,
            )?,
            incorrect_passwords: RecencySet::from_entries(
                RecencyKind::IncorrectPasswords,
                incorrect_password_capacity,
                incorrect_passwords,
            )?,
        })
    }

    /// Capture everything needed to [`restore`](Self::restore) this state.
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            identity: self.identity.clone(),
            credential: self.credential.clone(),
            credit_limit: self.credit_limit,
            credit_half_life: self.consumed_credit.half_life(),
            created_at: self.created_at,
            consumed_credit: self.consumed_credit.value(),
            device_capacity: self.successful_devices.capacity(),
            successful_devices: self.successful_devices.entries(),
            incorrect_password_capacity: self.incorrect_passwords.capacity(),
            incorrect_passwords: self.incorrect_passwords.entries(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    pub fn credential(&self) -> &StoredCredential {
        &self.credential
    }

    pub fn credit_limit(&self) -> f64 {
        self.credit_limit
    }

    pub fn credit_half_life(&self) -> Duration {
        self.consumed_credit.half_life()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Devices that have completed a successful login, most recent last.
    pub fn successful_devices(&self) -> &RecencySet<DeviceHash> {
        &self.successful_devices
    }

    /// Recently failed password hashes, most recent last.
    pub fn incorrect_passwords(&self) -> &RecencySet<PasswordHash> {
        &self.incorrect_passwords
    }

    // -------------------------------------------------------------------------
    // Devices
    // -------------------------------------------------------------------------

    /// Returns `true` if `device` is among the remembered successful devices.
    pub fn has_device_succeeded_before(&self, device: &DeviceHash) -> bool {
        self.successful_devices.contains(device)
    }

    /// Remember that `device` completed a successful login at `when`.
    ///
    /// Repeated calls only refresh recency. Returns `true` if the device was
    /// not remembered before this call.
    pub fn record_successful_login(&mut self, device: DeviceHash, when: Timestamp) -> bool {
        let new_device = self.successful_devices.touch(device, when);
        if new_device {
            debug!(account = %self.identity, %when, "account: new successful device");
        }
        new_device
    }

    // -------------------------------------------------------------------------
    // Incorrect passwords
    // -------------------------------------------------------------------------

    /// Record a failed attempt with phase-two hash `password` at `when`.
    ///
    /// Returns `true` if the identical hash is already remembered (a retry of
    /// the same wrong guess, which upstream penalty logic should not count
    /// twice). Returns `false` for a hash not currently remembered, including
    /// one that was seen long ago and has since been evicted.
    pub fn record_incorrect_attempt(&mut self, password: PasswordHash, when: Timestamp) -> bool {
        let repeat = !self.incorrect_passwords.touch(password, when);
        debug!(account = %self.identity, %when, repeat, "account: incorrect password recorded");
        repeat
    }

    // -------------------------------------------------------------------------
    // Credit
    // -------------------------------------------------------------------------

    /// Consumed credit decayed to `as_of`.
    pub fn credits_consumed(&self, as_of: Timestamp) -> f64 {
        self.consumed_credit.consumed(as_of)
    }

    /// Consume `amount` credit at `at`; returns the new balance.
    ///
    /// The balance may exceed [`credit_limit`](Self::credit_limit); deciding
    /// what to do about that is the caller's job.
    pub fn consume_credit(&mut self, amount: f64, at: Timestamp) -> Result<f64, CreditError> {
        self.consumed_credit.consume(amount, at)
    }

    /// Credit still available before the limit is reached, never negative.
    pub fn credits_remaining(&self, as_of: Timestamp) -> f64 {
        (self.credit_limit - self.credits_consumed(as_of)).max(0.0)
    }

    /// Returns `true` once consumed credit has reached the limit.
    pub fn is_credit_exhausted(&self, as_of: Timestamp) -> bool {
        self.credits_consumed(as_of) >= self.credit_limit
    }

    /// Fold elapsed decay into the stored balance. See [`CreditLedger::settle`].
    pub fn settle_credit(&mut self, as_of: Timestamp) {
        self.consumed_credit.settle(as_of);
    }
}
