//! Freshness check for login-flow nonces.
//!
//! The login callback rejects correlation values older than the configured
//! maximum age before it exchanges an authorization code.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Default nonce max age in seconds.
pub const DEFAULT_NONCE_MAX_AGE_SECONDS: i64 = 60;

/// Max age value that disables the check.
pub const NONCE_CHECK_DISABLED: i64 = -1;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Nonce max age must be -1 (disabled) or a non-negative number of seconds, got {0}")]
pub struct InvalidNonceMaxAge(pub i64);

/// Nonce freshness window.
///
/// `-1` disables the check, `0` only accepts a nonce issued at the same
/// instant, and a positive value accepts nonces at most that many seconds old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceMaxAge(i64);

impl NonceMaxAge {
    pub const DISABLED: NonceMaxAge = NonceMaxAge(NONCE_CHECK_DISABLED);

    /// # Errors
    ///
    /// Returns `InvalidNonceMaxAge` for values below `-1`.
    pub fn new(seconds: i64) -> Result<Self, InvalidNonceMaxAge> {
        if seconds < NONCE_CHECK_DISABLED {
            return Err(InvalidNonceMaxAge(seconds));
        }
        Ok(Self(seconds))
    }

    pub fn seconds(self) -> i64 {
        self.0
    }

    pub fn is_disabled(self) -> bool {
        self.0 == NONCE_CHECK_DISABLED
    }
}

impl Default for NonceMaxAge {
    fn default() -> Self {
        Self(DEFAULT_NONCE_MAX_AGE_SECONDS)
    }
}

impl fmt::Display for NonceMaxAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_disabled() {
            f.write_str("disabled")
        } else {
            write!(f, "{}s", self.0)
        }
    }
}

/// Whether a nonce issued at `issued_at` is still fresh at `now`.
///
/// A nonce dated after `now` is rejected unless the check is disabled.
pub fn is_valid(issued_at: DateTime<Utc>, now: DateTime<Utc>, max_age: NonceMaxAge) -> bool {
    if max_age.is_disabled() {
        return true;
    }

    let age_ms = now.signed_duration_since(issued_at).num_milliseconds();
    if age_ms < 0 {
        tracing::debug!(target: "fa.nonce", age_ms, "Nonce rejected: issued in the future");
        return false;
    }

    let valid = age_ms <= max_age.seconds().saturating_mul(1000);
    if !valid {
        tracing::debug!(
            target: "fa.nonce",
            age_ms,
            max_age_seconds = max_age.seconds(),
            "Nonce rejected: too old"
        );
    }
    valid
}
