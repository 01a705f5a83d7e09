//! # strike-core
//! Foundation types and traits for the Strike account abuse-signal engine.

pub mod constants;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
