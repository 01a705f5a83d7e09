//! Adversarial test suite for Strike.
//!
//! Integration tests that drive the engine the way a credential-guessing
//! campaign would: floods of distinct guesses, replayed guesses, skewed
//! clocks and many workers hammering the same account.

pub mod helpers;
