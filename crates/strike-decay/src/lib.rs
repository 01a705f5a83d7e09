//! # strike-decay — Half-life decay engine and credit ledger.
//!
//! - **Decay engine**: `value * 2^(-elapsed / half_life)` with elapsed time
//!   clamped at zero, so clock skew can never amplify a balance.
//! - **Credit ledger**: a decaying consumed-credit balance. Consumption decays
//!   the stored balance to the consume time and adds atomically; reads decay
//!   lazily without mutating.

pub mod engine;
pub mod ledger;

pub use engine::DecayEngine;
pub use ledger::CreditLedger;
