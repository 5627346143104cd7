//! Metrics definitions for the forward-auth core.
//!
//! All metrics follow Prometheus naming conventions:
//! - `fa_` prefix
//! - `_total` suffix for counters
//!
//! No recorder is installed here; the embedding process chooses the exporter.
//!
//! # Cardinality
//!
//! Labels are bounded by the enums that produce them:
//! - `outcome`: anonymous, authenticated, error
//! - `reason`: the `AuthError` codes, or `none`
//! - `decision`: allow, allow_authenticated, login_required, forbidden
//! - `token`: access, id
//! - `result`: bounded by verification or nonce labels
//!
//! Application names and subjects are never used as labels.

use metrics::counter;

/// Record an authentication outcome.
///
/// Metric: `fa_authentications_total`
/// Labels: `outcome`, `reason`
pub fn record_authentication(outcome: &'static str, reason: Option<&'static str>) {
    counter!("fa_authentications_total",
        "outcome" => outcome,
        "reason" => reason.unwrap_or("none")
    )
    .increment(1);
}

/// Record an access decision.
///
/// Metric: `fa_access_decisions_total`
/// Labels: `decision`
pub fn record_access_decision(decision: &'static str) {
    counter!("fa_access_decisions_total", "decision" => decision).increment(1);
}

/// Record the result of verifying one token.
///
/// Metric: `fa_token_verifications_total`
/// Labels: `token` (access or id), `result`
pub fn record_token_verification(token: &'static str, result: &'static str) {
    counter!("fa_token_verifications_total",
        "token" => token,
        "result" => result
    )
    .increment(1);
}

/// Record a nonce freshness check.
///
/// Metric: `fa_nonce_checks_total`
/// Labels: `result` (valid or stale)
pub fn record_nonce_check(valid: bool) {
    let result = if valid { "valid" } else { "stale" };
    counter!("fa_nonce_checks_total", "result" => result).increment(1);
}
