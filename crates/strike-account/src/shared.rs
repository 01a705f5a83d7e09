//! Per-account exclusive locking.
//!
//! Eviction and decay-then-add are read-modify-write sequences; two
//! interleaved consumes could both decay from the same stale basis and lose
//! an update. [`SharedAccount`] holds one `parking_lot::Mutex` per account for
//! the whole of every call, reads included, so no read observes a half-applied
//! mutation. Different accounts never contend.

use parking_lot::Mutex;
use strike_core::error::CreditError;
use strike_core::types::{AccountIdentity, AccountSnapshot, DeviceHash, PasswordHash, Timestamp};

use crate::account::AccountState;

/// An [`AccountState`] behind its own lock, shareable across worker threads.
#[derive(Debug)]
pub struct SharedAccount {
    identity: AccountIdentity,
    state: Mutex<AccountState>,
}

impl SharedAccount {
    pub fn new(state: AccountState) -> Self {
        Self {
            identity: state.identity().clone(),
            state: Mutex::new(state),
        }
    }

    /// The account identity. Immutable, so readable without the lock.
    pub fn identity(&self) -> &AccountIdentity {
        &self.identity
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// Use this for compound decisions that must be atomic, e.g. checking the
    /// remaining credit and consuming in one step.
    pub fn with<R>(&self, f: impl FnOnce(&mut AccountState) -> R) -> R {
        f(&mut self.state.lock())
    }

    /// Consistent copy of the state for persistence.
    pub fn snapshot(&self) -> AccountSnapshot {
        self.state.lock().snapshot()
    }

    pub fn has_device_succeeded_before(&self, device: &DeviceHash) -> bool {
        self.state.lock().has_device_succeeded_before(device)
    }

    pub fn record_successful_login(&self, device: DeviceHash, when: Timestamp) -> bool {
        self.state.lock().record_successful_login(device, when)
    }

    pub fn record_incorrect_attempt(&self, password: PasswordHash, when: Timestamp) -> bool {
        self.state.lock().record_incorrect_attempt(password, when)
    }

    pub fn credits_consumed(&self, as_of: Timestamp) -> f64 {
        self.state.lock().credits_consumed(as_of)
    }

    pub fn consume_credit(&self, amount: f64, at: Timestamp) -> Result<f64, CreditError> {
        self.state.lock().consume_credit(amount, at)
    }

    pub fn credits_remaining(&self, as_of: Timestamp) -> f64 {
        self.state.lock().credits_remaining(as_of)
    }

    pub fn is_credit_exhausted(&self, as_of: Timestamp) -> bool {
        self.state.lock().is_credit_exhausted(as_of)
    }

    pub fn settle_credit(&self, as_of: Timestamp) {
        self.state.lock().settle_credit(as_of)
    }

    /// Unwrap the state, consuming the handle.
    pub fn into_inner(self) -> AccountState {
        self.state.into_inner()
    }
}

impl From<AccountState> for SharedAccount {
    fn from(state: AccountState) -> Self {
        Self::new(state)
    }
}
