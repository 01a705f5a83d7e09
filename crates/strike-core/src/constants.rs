//! Engine constants. Times are Unix milliseconds unless stated otherwise.

use std::time::Duration;

/// Milliseconds per second, used when converting [`Duration`]s and timestamps.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Default ceiling on consumed credit before upstream blocking kicks in.
///
/// The ledger itself never clamps to this value; callers compare the decayed
/// balance against it.
pub const DEFAULT_CREDIT_LIMIT: f64 = 50.0;

/// Default half-life of the consumed-credit balance.
pub const DEFAULT_CREDIT_HALF_LIFE: Duration = Duration::from_secs(12 * 60 * 60); // 12 hours

/// Default number of device cookie hashes remembered per account.
pub const DEFAULT_DEVICE_CAPACITY: usize = 12;

/// Default number of incorrect password hashes remembered per account.
///
/// Larger than [`DEFAULT_DEVICE_CAPACITY`]: guessing campaigns cycle through
/// many more distinct passwords than a user owns devices.
pub const DEFAULT_INCORRECT_PASSWORD_CAPACITY: usize = 64;

/// Credit limit used by strict configuration presets.
pub const STRICT_CREDIT_LIMIT: f64 = 20.0;

/// Half-life used by strict configuration presets.
pub const STRICT_CREDIT_HALF_LIFE: Duration = Duration::from_secs(24 * 60 * 60); // 24 hours

/// Credit limit used by lenient configuration presets.
pub const LENIENT_CREDIT_LIMIT: f64 = 100.0;

/// Half-life used by lenient configuration presets.
pub const LENIENT_CREDIT_HALF_LIFE: Duration = Duration::from_secs(60 * 60); // 1 hour

/// Environment variable overriding the credit limit.
pub const ENV_CREDIT_LIMIT: &str = "STRIKE_CREDIT_LIMIT";
/// Environment variable overriding the credit half-life, in whole seconds.
pub const ENV_CREDIT_HALF_LIFE_SECS: &str = "STRIKE_CREDIT_HALF_LIFE_SECS";
/// Environment variable overriding the device recency capacity.
pub const ENV_DEVICE_CAPACITY: &str = "STRIKE_DEVICE_CAPACITY";
/// Environment variable overriding the incorrect-password recency capacity.
pub const ENV_INCORRECT_PASSWORD_CAPACITY: &str = "STRIKE_INCORRECT_PASSWORD_CAPACITY";
