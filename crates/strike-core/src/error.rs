//! Error types for the Strike engine.
use thiserror::Error;

/// Which recency set an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecencyKind {
    /// Hashes of device cookies that completed a successful login.
    SuccessfulDevices,
    /// Hashes of passwords that failed verification.
    IncorrectPasswords,
}

impl std::fmt::Display for RecencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuccessfulDevices => f.write_str("successful-devices"),
            Self::IncorrectPasswords => f.write_str("incorrect-passwords"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("account identity must not be empty")] EmptyIdentity,
    #[error("credit half-life must be positive")] NonPositiveHalfLife,
    #[error("recency capacity must be positive ({0})")] ZeroCapacity(RecencyKind),
    #[error("credit limit must be finite and non-negative: {0}")] InvalidCreditLimit(f64),
    #[error("invalid value for {var}: {value:?}")] InvalidEnv { var: String, value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreditError {
    #[error("credit amount must be finite and non-negative: {0}")] InvalidAmount(f64),
    #[error("consuming {amount} would overflow the credit balance")] BalanceOverflow { amount: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("{kind} holds {len} entries but capacity is {capacity}")] RecencyOverflow { kind: RecencyKind, len: usize, capacity: usize },
    #[error("consumed credit must be finite and non-negative: {0}")] InvalidBalance(f64),
    #[error(transparent)] Config(#[from] ConfigError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend: {0}")] Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("account already exists: {0}")] AlreadyExists(String),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Snapshot(#[from] SnapshotError),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum StrikeError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Credit(#[from] CreditError),
    #[error(transparent)] Snapshot(#[from] SnapshotError),
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_recency_set() {
        let err = ConfigError::ZeroCapacity(RecencyKind::SuccessfulDevices);
        assert_eq!(err.to_string(), "recency capacity must be positive (successful-devices)");

        let err = SnapshotError::RecencyOverflow {
            kind: RecencyKind::IncorrectPasswords,
            len: 70,
            capacity: 64,
        };
        assert_eq!(err.to_string(), "incorrect-passwords holds 70 entries but capacity is 64");
    }

    #[test]
    fn umbrella_is_transparent() {
        let err: StrikeError = CreditError::InvalidAmount(-1.0).into();
        assert_eq!(err.to_string(), "credit amount must be finite and non-negative: -1");

        let err: StrikeError = RegistryError::from(StoreError::Backend("disk full".into())).into();
        assert_eq!(err.to_string(), "storage backend: disk full");
    }
}
