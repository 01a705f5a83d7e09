//! Shared test helpers for integration tests.
//!
//! The engine only ever sees opaque hashes. These helpers stand in for the
//! external hashing collaborator by hex-encoding SHA-256 digests, so tests
//! exercise realistic fixed-length values.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use strike_account::{AccountConfig, AccountRegistry, AccountState};
use strike_core::store::MemoryAccountStore;
use strike_core::types::{DeviceHash, PasswordHash, StoredCredential, Timestamp};

/// One hour, the half-life used by most scenarios.
pub const HOUR: Duration = Duration::from_secs(60 * 60);

/// An arbitrary fixed start time (2023-11-14T22:13:20Z).
pub const T0: Timestamp = Timestamp::from_secs(1_700_000_000);

fn sha256_hex(domain: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.as_bytes());
    hasher.update([0u8]);
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Device hash for a cookie value.
pub fn device(cookie: &str) -> DeviceHash {
    DeviceHash::new(sha256_hex("device", cookie))
}

/// Phase-two hash for a password guess.
pub fn password(guess: &str) -> PasswordHash {
    PasswordHash::new(sha256_hex("password", guess))
}

/// Timestamp `secs` seconds after [`T0`].
pub fn at(secs: u64) -> Timestamp {
    T0 + Duration::from_secs(secs)
}

/// Configuration with a one-hour half-life and small recency sets.
pub fn test_config(device_capacity: usize, incorrect_password_capacity: usize) -> AccountConfig {
    AccountConfig {
        credit_limit: 50.0,
        credit_half_life: HOUR,
        device_capacity,
        incorrect_password_capacity,
    }
}

/// A fresh account created at [`T0`].
pub fn account(config: &AccountConfig) -> AccountState {
    AccountState::initialize("victim@example.com", StoredCredential::new("opaque"), config, T0)
        .expect("valid test config")
}

/// A registry over a fresh in-memory store.
pub fn registry(config: AccountConfig) -> (AccountRegistry, Arc<MemoryAccountStore>) {
    let store = Arc::new(MemoryAccountStore::new());
    let registry = AccountRegistry::new(config, store.clone()).expect("valid test config");
    (registry, store)
}

/// Floating-point comparison with relative tolerance.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}
