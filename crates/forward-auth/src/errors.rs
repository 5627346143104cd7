//! Authentication failure reasons.
//!
//! Failures are data, not control flow: they travel inside
//! [`AuthenticationOutcome::Error`](crate::authenticator::AuthenticationOutcome)
//! and the HTTP layer decides whether to redirect or reject. Display strings
//! are intentionally generic; `code()` gives a stable identifier for metrics
//! and response mapping.

use serde::Serialize;
use thiserror::Error;

/// Why a request could not be authenticated.
///
/// The first four variants are produced by the token verifier for a single
/// token. The last two are produced by the authenticator from the combination
/// of both tokens and the application's policy.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthError {
    /// Token string is not a structurally valid signed token.
    #[error("The token is malformed")]
    Malformed,

    /// Signature does not verify against any trusted key.
    #[error("The token signature is invalid")]
    InvalidSignature,

    /// Current time is at or past the token's expiry.
    #[error("The token has expired")]
    Expired,

    /// Expected audience or client ID is absent from the token's audience.
    #[error("The token was not issued for this application")]
    AudienceMismatch,

    /// One of the two required tokens is missing while the other is valid.
    #[error("Both an access token and an identity token are required")]
    IncompleteCredentialSet,

    /// Both tokens verify but the required permissions are not granted.
    #[error("The required permissions are not granted")]
    PermissionDenied,
}

impl AuthError {
    /// Stable snake_case identifier, used as a metrics label and by the
    /// transport layer when mapping to responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::AudienceMismatch => "audience_mismatch",
            AuthError::IncompleteCredentialSet => "incomplete_credential_set",
            AuthError::PermissionDenied => "permission_denied",
        }
    }

    /// Whether sending the user through login again could resolve the failure.
    ///
    /// A permission failure is a policy decision about a correctly
    /// authenticated subject; a fresh login yields the same subject.
    pub fn is_recoverable_by_login(&self) -> bool {
        !matches!(self, AuthError::PermissionDenied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            AuthError::Malformed,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::AudienceMismatch,
            AuthError::IncompleteCredentialSet,
            AuthError::PermissionDenied,
        ];
        let codes: std::collections::HashSet<&str> = all.iter().map(AuthError::code).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_serialized_form_matches_code() {
        let json = serde_json::to_string(&AuthError::AudienceMismatch).unwrap();
        assert_eq!(json, "\"audience_mismatch\"");
        let json = serde_json::to_string(&AuthError::IncompleteCredentialSet).unwrap();
        assert_eq!(json, format!("\"{}\"", AuthError::IncompleteCredentialSet.code()));
    }

    #[test]
    fn test_only_permission_denied_is_not_recoverable() {
        assert!(!AuthError::PermissionDenied.is_recoverable_by_login());
        assert!(AuthError::Expired.is_recoverable_by_login());
        assert!(AuthError::Malformed.is_recoverable_by_login());
        assert!(AuthError::IncompleteCredentialSet.is_recoverable_by_login());
    }

    #[test]
    fn test_display_does_not_leak_details() {
        assert_eq!(AuthError::InvalidSignature.to_string(), "The token signature is invalid");
    }
}
