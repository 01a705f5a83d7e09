//! Per-account configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strike_core::constants::{
    DEFAULT_CREDIT_HALF_LIFE, DEFAULT_CREDIT_LIMIT, DEFAULT_DEVICE_CAPACITY,
    DEFAULT_INCORRECT_PASSWORD_CAPACITY, ENV_CREDIT_HALF_LIFE_SECS, ENV_CREDIT_LIMIT,
    ENV_DEVICE_CAPACITY, ENV_INCORRECT_PASSWORD_CAPACITY, LENIENT_CREDIT_HALF_LIFE,
    LENIENT_CREDIT_LIMIT, STRICT_CREDIT_HALF_LIFE, STRICT_CREDIT_LIMIT,
};
use strike_core::error::{ConfigError, RecencyKind};

/// Parameters fixed for an account at creation time.
///
/// `credit_half_life` in particular must never change for an existing
/// account: stored balances are only meaningful relative to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Consumed credit at or above which upstream blocking applies.
    pub credit_limit: f64,
    /// Half-life of the consumed-credit balance.
    pub credit_half_life: Duration,
    /// Number of successful device hashes remembered.
    pub device_capacity: usize,
    /// Number of incorrect password hashes remembered.
    pub incorrect_password_capacity: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            credit_limit: DEFAULT_CREDIT_LIMIT,
            credit_half_life: DEFAULT_CREDIT_HALF_LIFE,
            device_capacity: DEFAULT_DEVICE_CAPACITY,
            incorrect_password_capacity: DEFAULT_INCORRECT_PASSWORD_CAPACITY,
        }
    }
}

impl AccountConfig {
    /// Preset for high-value accounts: low limit, slow recovery.
    pub fn strict() -> Self {
        Self {
            credit_limit: STRICT_CREDIT_LIMIT,
            credit_half_life: STRICT_CREDIT_HALF_LIFE,
            ..Self::default()
        }
    }

    /// Preset for low-friction deployments: high limit, fast recovery.
    pub fn lenient() -> Self {
        Self {
            credit_limit: LENIENT_CREDIT_LIMIT,
            credit_half_life: LENIENT_CREDIT_HALF_LIFE,
            ..Self::default()
        }
    }

    /// Load configuration from `STRIKE_*` environment variables.
    ///
    /// Unset variables fall back to [`AccountConfig::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let credit_limit = parse_var(&lookup, ENV_CREDIT_LIMIT, defaults.credit_limit)?;
        let half_life_secs = parse_var(
            &lookup,
            ENV_CREDIT_HALF_LIFE_SECS,
            defaults.credit_half_life.as_secs(),
        )?;
        let device_capacity = parse_var(&lookup, ENV_DEVICE_CAPACITY, defaults.device_capacity)?;
        let incorrect_password_capacity = parse_var(
            &lookup,
            ENV_INCORRECT_PASSWORD_CAPACITY,
            defaults.incorrect_password_capacity,
        )?;

        let config = Self {
            credit_limit,
            credit_half_life: Duration::from_secs(half_life_secs),
            device_capacity,
            incorrect_password_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every field is usable for creating an account.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.credit_limit.is_finite() || self.credit_limit < 0.0 {
            return Err(ConfigError::InvalidCreditLimit(self.credit_limit));
        }
        if self.credit_half_life.is_zero() {
            return Err(ConfigError::NonPositiveHalfLife);
        }
        if self.device_capacity == 0 {
            return Err(ConfigError::ZeroCapacity(RecencyKind::SuccessfulDevices));
        }
        if self.incorrect_password_capacity == 0 {
            return Err(ConfigError::ZeroCapacity(RecencyKind::IncorrectPasswords));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw,
        }),
    }
}
