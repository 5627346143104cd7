//! Builder for signed test tokens.
//!
//! Starts with an empty claim set; tests set every claim they rely on.

use crate::crypto_fixtures::TokenSigner;
use serde_json::{Map, Value};

/// Fluent builder producing a JWT signed by any [`TokenSigner`].
///
/// # Example
/// ```rust,ignore
/// let raw = TestTokenBuilder::new(&keypair)
///     .subject("auth0|alice")
///     .audience("abc123")
///     .expires_at(now + 3600)
///     .claim("permissions", json!(["user"]))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder<'a> {
    signer: &'a dyn TokenSigner,
    claims: Map<String, Value>,
    include_kid: bool,
}

impl<'a> TestTokenBuilder<'a> {
    pub fn new(signer: &'a dyn TokenSigner) -> Self {
        Self {
            signer,
            claims: Map::new(),
            include_kid: true,
        }
    }

    pub fn subject(self, subject: &str) -> Self {
        self.claim("sub", subject)
    }

    pub fn issuer(self, issuer: &str) -> Self {
        self.claim("iss", issuer)
    }

    /// Single string `aud`.
    pub fn audience(self, audience: &str) -> Self {
        self.claim("aud", audience)
    }

    /// Array `aud`.
    pub fn audiences(self, audiences: &[&str]) -> Self {
        self.claim("aud", audiences.to_vec())
    }

    pub fn issued_at(self, timestamp: i64) -> Self {
        self.claim("iat", timestamp)
    }

    pub fn expires_at(self, timestamp: i64) -> Self {
        self.claim("exp", timestamp)
    }

    /// Set any claim, replacing an earlier value.
    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    /// Omit the `kid` header.
    pub fn without_kid(mut self) -> Self {
        self.include_kid = false;
        self
    }

    /// The claim set as it will be signed.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// # Panics
    ///
    /// Panics if signing fails.
    pub fn build(self) -> String {
        self.signer
            .sign(&self.claims, self.include_kid)
            .expect("signing a test token")
    }
}
