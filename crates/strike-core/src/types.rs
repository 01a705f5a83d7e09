//! Core domain types: timestamps, identities, opaque hashes, decaying values.
//!
//! Hash values are produced by an external hashing collaborator and are
//! treated as opaque strings. Nothing in this crate computes or verifies them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A point in time as Unix milliseconds.
///
/// Every operation in the engine takes its notion of "now" as an explicit
/// `Timestamp` argument; the engine never reads the wall clock itself.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Self = Self(0);

    /// Create a timestamp from Unix milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create a timestamp from whole Unix seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(crate::constants::MILLIS_PER_SEC))
    }

    /// Unix milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Convert from a UTC datetime. Instants before the epoch map to [`Timestamp::EPOCH`].
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp_millis()).unwrap_or(0))
    }

    /// Convert to a UTC datetime, or `None` if out of chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(i64::try_from(self.0).ok()?)
    }

    /// Current wall-clock time, for callers stamping incoming attempts.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Time elapsed since `earlier`, clamped to zero if `earlier` is later.
    pub fn saturating_elapsed_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Add a duration, saturating at `u64::MAX` milliseconds.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

// ---------------------------------------------------------------------------
// AccountIdentity
// ---------------------------------------------------------------------------

/// Immutable, non-empty account identifier (username, email or internal id).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct AccountIdentity(String);

impl AccountIdentity {
    /// Create an identity, rejecting empty or whitespace-only strings.
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        Ok(Self(id))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountIdentity {
    type Error = ConfigError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<AccountIdentity> for String {
    fn from(id: AccountIdentity) -> Self {
        id.0
    }
}

impl fmt::Display for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Opaque hashes
// ---------------------------------------------------------------------------

macro_rules! opaque_hash {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a hash value produced by the hashing collaborator.
            pub fn new(hash: impl Into<String>) -> Self {
                Self(hash.into())
            }

            /// The hash as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(hash: String) -> Self {
                Self(hash)
            }
        }

        impl From<&str> for $name {
            fn from(hash: &str) -> Self {
                Self(hash.to_owned())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

opaque_hash! {
    /// Hash of a device cookie presented with a login attempt.
    DeviceHash
}

opaque_hash! {
    /// Phase-two hash of a submitted password.
    ///
    /// Only tracked to recognise repeats of the identical wrong guess.
    PasswordHash
}

/// Opaque password verification material stored with an account.
///
/// Carried through snapshots untouched. `Debug` output is redacted.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct StoredCredential(String);

impl StoredCredential {
    /// Wrap verification material produced by the credential collaborator.
    pub fn new(material: impl Into<String>) -> Self {
        Self(material.into())
    }

    /// The raw material, for handing back to the verifier.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoredCredential(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// DecayingValue
// ---------------------------------------------------------------------------

/// A non-negative quantity that decays toward zero from `last_updated`.
///
/// `value(t) = last_value * 2^(-(t - last_updated) / half_life)`. The half-life
/// is owned by whoever holds the value (see `CreditLedger`).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DecayingValue {
    last_value: f64,
    last_updated: Timestamp,
}

impl DecayingValue {
    /// Create a value. Negative and non-finite inputs are stored as zero.
    pub fn new(last_value: f64, last_updated: Timestamp) -> Self {
        Self {
            last_value: normalize(last_value),
            last_updated,
        }
    }

    /// A zero value anchored at `at`.
    pub fn zero(at: Timestamp) -> Self {
        Self::new(0.0, at)
    }

    /// Value as of `last_updated`.
    pub fn last_value(&self) -> f64 {
        self.last_value
    }

    /// Timestamp the stored value refers to.
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Whether the stored fields satisfy the non-negative, finite invariant.
    ///
    /// Values built with [`DecayingValue::new`] always do; deserialized ones
    /// may not.
    pub fn is_valid(&self) -> bool {
        self.last_value.is_finite() && self.last_value >= 0.0
    }
}

fn normalize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

// ---------------------------------------------------------------------------
// Recency entries and account snapshots
// ---------------------------------------------------------------------------

/// One key of a recency set together with when it was last seen.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecencyEntry<K> {
    pub key: K,
    pub last_seen: Timestamp,
}

impl<K> RecencyEntry<K> {
    pub fn new(key: K, last_seen: Timestamp) -> Self {
        Self { key, last_seen }
    }
}

/// Everything needed to reconstruct an account's state.
///
/// This is the in-memory shape exchanged with the persistence collaborator.
/// The engine defines no file or wire format for it; any serde format works.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountSnapshot {
    pub identity: AccountIdentity,
    pub credential: StoredCredential,
    pub credit_limit: f64,
    pub credit_half_life: Duration,
    pub created_at: Timestamp,
    pub consumed_credit: DecayingValue,
    pub device_capacity: usize,
    /// Ordered oldest to newest.
    pub successful_devices: Vec<RecencyEntry<DeviceHash>>,
    pub incorrect_password_capacity: usize,
    /// Ordered oldest to newest.
    pub incorrect_passwords: Vec<RecencyEntry<PasswordHash>>,
}
