//! Credential rotation with retry.
//!
//! [`KeyRotator`] is the resilience layer every upstream call goes through.
//! Its state lives in [`ResilienceState`], one per rotator.

pub mod retry;
pub mod state;

pub use retry::{KeyRotator, RetryConfig};
pub use state::{ResilienceState, RotationReason, RotationStatus};
