//! JWT utilities shared across Forward Auth components.
//!
//! This module provides the structural half of JWT handling:
//! - Size limits for DoS prevention
//! - Header inspection (`alg`, `kid`) without signature verification
//! - Unverified payload decoding, used only to classify malformed input
//! - JWK key material decoding
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing returned here is trusted; callers MUST verify the signature
//!   before acting on any claim
//! - Error messages are generic to prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{peek_header, peek_claims};
//!
//! let header = peek_header(token)?;   // alg + optional kid for key lookup
//! let _ = peek_claims(token)?;        // payload is a JSON object
//! // ... then verify the signature with the selected key
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// - Typical identity tokens are 800-1500 bytes (RS256 signature, profile claims)
/// - 8KB leaves room for large permission lists while bounding decode cost
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during structural JWT inspection.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The token is invalid")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The token is invalid")]
    MalformedToken,
}

// =============================================================================
// Header Types
// =============================================================================

/// The parts of a JWT header needed to select a verification key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Signing algorithm name as written in the header (e.g. `RS256`, `EdDSA`).
    pub alg: String,

    /// Key ID, when the issuer publishes one. Empty strings are treated as absent.
    #[serde(default)]
    pub kid: Option<String>,
}

// =============================================================================
// Functions
// =============================================================================

/// Split a compact JWS into its three segments after the size check.
fn split_token(token: &str) -> Result<(&str, &str, &str), JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => {
            tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

/// Base64url-decode one segment and parse it as a JSON value.
fn decode_segment(segment: &str, name: &str) -> Result<serde_json::Value, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to decode JWT segment base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", segment = name, error = %e, "Failed to parse JWT segment JSON");
        JwtValidationError::MalformedToken
    })
}

/// Read the JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
/// - The `kid` value should only be used for key lookup in a trusted key set
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong segment count, bad base64, invalid JSON, or
///   a header without a string `alg`
pub fn peek_header(token: &str) -> Result<TokenHeader, JwtValidationError> {
    let (header_part, _, _) = split_token(token)?;
    let value = decode_segment(header_part, "header")?;

    let mut header: TokenHeader = serde_json::from_value(value).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "JWT header missing required fields");
        JwtValidationError::MalformedToken
    })?;

    if header.kid.as_deref().is_some_and(str::is_empty) {
        header.kid = None;
    }

    Ok(header)
}

/// Decode the JWT payload without verifying the signature.
///
/// Used to tell structurally broken tokens apart from well-formed tokens with
/// a bad signature. The returned claims are untrusted.
///
/// # Errors
///
/// Returns `MalformedToken` unless the payload is a base64url-encoded JSON
/// object, or `TokenTooLarge` if the size limit is exceeded.
pub fn peek_claims(
    token: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, JwtValidationError> {
    let (_, payload_part, _) = split_token(token)?;

    match decode_segment(payload_part, "payload")? {
        serde_json::Value::Object(claims) => Ok(claims),
        _ => {
            tracing::debug!(target: "common.jwt", "JWT payload is not a JSON object");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

/// Decode an Ed25519 public key from JWK `x` field (base64url format).
///
/// The `x` field in an OKP (Octet Key Pair) JWK contains the public key
/// in base64url encoding without padding.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the base64url content cannot be decoded.
///
/// # Example
///
/// ```rust,ignore
/// use common::jwt::decode_ed25519_public_key_jwk;
///
/// let x = jwk.x.as_ref().ok_or("missing x field")?;
/// let key_bytes = decode_ed25519_public_key_jwk(x)?;
/// let decoding_key = DecodingKey::from_ed_der(&key_bytes);
/// ```
pub fn decode_ed25519_public_key_jwk(x_b64url: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(x_b64url)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn token_with(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload)
        )
    }

    // -------------------------------------------------------------------------
    // Constants Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_max_jwt_size_is_8kb() {
        assert_eq!(MAX_JWT_SIZE_BYTES, 8192);
    }

    // -------------------------------------------------------------------------
    // peek_header Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_peek_header_with_kid() {
        let token = token_with(r#"{"alg":"RS256","typ":"JWT","kid":"key-01"}"#, "{}");

        let header = peek_header(&token).unwrap();
        assert_eq!(header.alg, "RS256");
        assert_eq!(header.kid.as_deref(), Some("key-01"));
    }

    #[test]
    fn test_peek_header_without_kid() {
        let token = token_with(r#"{"alg":"EdDSA","typ":"JWT"}"#, "{}");

        let header = peek_header(&token).unwrap();
        assert_eq!(header.alg, "EdDSA");
        assert!(header.kid.is_none());
    }

    #[test]
    fn test_peek_header_empty_kid_is_absent() {
        let token = token_with(r#"{"alg":"EdDSA","kid":""}"#, "{}");

        let header = peek_header(&token).unwrap();
        assert!(header.kid.is_none(), "Empty kid should be treated as absent");
    }

    #[test]
    fn test_peek_header_missing_alg() {
        let token = token_with(r#"{"typ":"JWT","kid":"key"}"#, "{}");
        assert_eq!(peek_header(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_header_non_string_kid() {
        let token = token_with(r#"{"alg":"EdDSA","kid":12345}"#, "{}");
        assert_eq!(peek_header(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_header_wrong_segment_count() {
        assert_eq!(peek_header("not-a-jwt"), Err(JwtValidationError::MalformedToken));
        assert_eq!(peek_header("only.two"), Err(JwtValidationError::MalformedToken));
        assert_eq!(peek_header("a.b.c.d"), Err(JwtValidationError::MalformedToken));
        assert_eq!(peek_header(""), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_header_empty_segments() {
        assert_eq!(peek_header(".payload.sig"), Err(JwtValidationError::MalformedToken));
        assert_eq!(peek_header("header..sig"), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_header_invalid_base64() {
        assert_eq!(
            peek_header("!!!invalid!!!.payload.signature"),
            Err(JwtValidationError::MalformedToken)
        );
    }

    #[test]
    fn test_peek_header_invalid_json() {
        let token = format!("{}.e30.signature", URL_SAFE_NO_PAD.encode("not-json"));
        assert_eq!(peek_header(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_header_oversized_token() {
        let oversized = "a".repeat(MAX_JWT_SIZE_BYTES + 1);
        assert_eq!(peek_header(&oversized), Err(JwtValidationError::TokenTooLarge));
    }

    #[test]
    fn test_peek_header_at_size_limit() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA","kid":"key"}"#);
        let remaining = MAX_JWT_SIZE_BYTES - header_b64.len() - 2; // -2 for two dots
        let payload_len = remaining / 2;
        let sig_len = remaining - payload_len;
        let token = format!(
            "{}.{}.{}",
            header_b64,
            "a".repeat(payload_len),
            "b".repeat(sig_len)
        );

        assert_eq!(token.len(), MAX_JWT_SIZE_BYTES);
        assert_eq!(peek_header(&token).unwrap().kid.as_deref(), Some("key"));
    }

    // -------------------------------------------------------------------------
    // peek_claims Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_peek_claims_object() {
        let token = token_with(r#"{"alg":"EdDSA"}"#, r#"{"sub":"user-1","exp":10}"#);

        let claims = peek_claims(&token).unwrap();
        assert_eq!(claims.get("sub").and_then(|v| v.as_str()), Some("user-1"));
        assert_eq!(claims.get("exp").and_then(serde_json::Value::as_i64), Some(10));
    }

    #[test]
    fn test_peek_claims_rejects_non_object_payload() {
        let token = token_with(r#"{"alg":"EdDSA"}"#, r#"["sub"]"#);
        assert_eq!(peek_claims(&token), Err(JwtValidationError::MalformedToken));
    }

    #[test]
    fn test_peek_claims_rejects_garbage_payload() {
        let token = format!(
            "{}.%%%.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"EdDSA"}"#)
        );
        assert_eq!(peek_claims(&token), Err(JwtValidationError::MalformedToken));
    }

    // -------------------------------------------------------------------------
    // Key Decoding Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_ed25519_public_key_jwk() {
        let x = "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo";
        let result = decode_ed25519_public_key_jwk(x);
        assert_eq!(result.unwrap().len(), 32); // Ed25519 public key is 32 bytes
    }

    #[test]
    fn test_decode_ed25519_public_key_jwk_invalid() {
        assert!(decode_ed25519_public_key_jwk("not-valid-base64url!!!").is_err());
    }
}
