//! # strike-account
//! Per-account abuse signals for login defence.
//!
//! - [`RecencySet`] — capacity-bounded key → last-seen map with
//!   least-recently-seen eviction
//! - [`AccountState`] — credit ledger plus successful-device and
//!   incorrect-password recency sets for one account
//! - [`SharedAccount`] — an account behind its own exclusive lock
//! - [`AccountRegistry`] — concurrent map of live accounts over an
//!   [`AccountStore`](strike_core::traits::AccountStore)
//! - [`AccountConfig`] — per-account configuration

pub mod account;
pub mod config;
pub mod recency;
pub mod registry;
pub mod shared;

pub use account::AccountState;
pub use config::AccountConfig;
pub use recency::RecencySet;
pub use registry::AccountRegistry;
pub use shared::SharedAccount;
