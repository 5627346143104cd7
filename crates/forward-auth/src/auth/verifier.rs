//! Token verification.
//!
//! Validates raw bearer tokens against the current trusted key snapshot.
//!
//! # Check order
//!
//! 1. Absent or empty input - `NoToken`
//! 2. Size limit, header and payload structure, registered claim shapes - `Malformed`
//! 3. Signature against a trusted key selected by `kid`/`alg` - `InvalidSignature`
//! 4. Expiry (`now >= exp`) - `Expired`
//! 5. Audience contains the expected value - `AudienceMismatch`
//!
//! The first failing check determines the reported reason.

use crate::auth::jwks::KeySource;
use crate::auth::token::Token;
use crate::errors::AuthError;
use common::jwt::{peek_claims, peek_header};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use std::sync::Arc;
use tracing::instrument;

/// Result of verifying one (possibly absent) token.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// No credential was supplied.
    NoToken,
    Valid(Token),
    Invalid(AuthError),
}

impl Verification {
    pub fn is_absent(&self) -> bool {
        matches!(self, Verification::NoToken)
    }

    /// Label used for metrics: `absent`, `valid`, or the failure code.
    pub fn label(&self) -> &'static str {
        match self {
            Verification::NoToken => "absent",
            Verification::Valid(_) => "valid",
            Verification::Invalid(reason) => reason.code(),
        }
    }
}

/// Verifies tokens using an injected key source.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeySource>,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeySource>) -> Self {
        Self { keys }
    }

    /// Verify against the wall clock.
    pub fn verify(&self, raw: Option<&str>, expected_audience: &str) -> Verification {
        self.verify_at(raw, expected_audience, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit `now` (Unix epoch seconds).
    #[instrument(skip_all, fields(audience = %expected_audience))]
    pub fn verify_at(&self, raw: Option<&str>, expected_audience: &str, now: i64) -> Verification {
        let token = match raw.map(str::trim) {
            None | Some("") => return Verification::NoToken,
            Some(token) => token,
        };

        match self.check(token, expected_audience, now) {
            Ok(token) => {
                tracing::debug!(target: "fa.auth.verify", "Token verified");
                Verification::Valid(token)
            }
            Err(reason) => {
                tracing::debug!(target: "fa.auth.verify", reason = reason.code(), "Token rejected");
                Verification::Invalid(reason)
            }
        }
    }

    fn check(&self, token: &str, expected_audience: &str, now: i64) -> Result<Token, AuthError> {
        // 1. Structure: header, payload, registered claims
        let header = peek_header(token).map_err(|_| AuthError::Malformed)?;
        let claims = peek_claims(token).map_err(|_| AuthError::Malformed)?;
        let parsed = Token::from_claims(token, claims)?;

        // 2. Signature
        let alg: Algorithm = header.alg.parse().map_err(|_| {
            tracing::debug!(target: "fa.auth.verify", alg = %header.alg, "Unsupported token algorithm");
            AuthError::InvalidSignature
        })?;
        self.verify_signature(token, header.kid.as_deref(), alg)?;

        // 3. Expiry
        if now >= parsed.expires_at() {
            tracing::debug!(
                target: "fa.auth.verify",
                exp = parsed.expires_at(),
                now,
                "Token expired"
            );
            return Err(AuthError::Expired);
        }

        // 4. Audience
        if !parsed.has_audience(expected_audience) {
            return Err(AuthError::AudienceMismatch);
        }

        Ok(parsed)
    }

    fn verify_signature(&self, token: &str, kid: Option<&str>, alg: Algorithm) -> Result<(), AuthError> {
        let snapshot = self.keys.current_keys();

        // Expiry and audience are checked separately so each failure keeps
        // its own reason.
        let mut validation = Validation::new(alg);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let mut tried = 0usize;
        let mut reason = AuthError::InvalidSignature;
        for key in snapshot.candidates(kid, alg) {
            tried += 1;
            match decode::<serde_json::Value>(token, key.decoding_key(), &validation) {
                Ok(_) => return Ok(()),
                Err(e) => {
                    tracing::debug!(target: "fa.auth.verify", kid = ?key.kid(), error = %e, "Signature check failed");
                    reason = classify(e.kind());
                }
            }
        }

        if tried == 0 {
            tracing::debug!(target: "fa.auth.verify", kid = ?kid, alg = ?alg, "No trusted key for token");
        }
        Err(reason)
    }
}

/// Map a `jsonwebtoken` failure onto the verification taxonomy.
fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::Malformed
        }
        _ => AuthError::InvalidSignature,
    }
}
