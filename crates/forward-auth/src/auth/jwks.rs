//! Trusted signing keys.
//!
//! Fetching and caching the identity provider's JWKS happens outside the
//! decision core. The core only sees a [`KeySource`], which hands out an
//! immutable [`JwkSet`] snapshot for each verification call.
//!
//! # Security
//!
//! - Only signature keys are trusted (`use` absent or `sig`)
//! - A JWK that pins `alg` is only used for that algorithm
//! - Unusable keys are skipped with a warning rather than failing the whole set

use common::jwt::decode_ed25519_public_key_jwk;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// JSON Web Key as published in a JWKS document.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type: "OKP" (Ed25519) or "RSA".
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Curve name ("Ed25519" for OKP keys).
    #[serde(default)]
    pub crv: Option<String>,

    /// OKP public key value (base64url encoded).
    #[serde(default)]
    pub x: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,

    /// Algorithm the key is restricted to, if any.
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use ("sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS document: `{"keys": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("Invalid JWKS document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyFamily {
    Ed25519,
    Rsa,
}

impl KeyFamily {
    fn supports(self, alg: Algorithm) -> bool {
        match self {
            KeyFamily::Ed25519 => alg == Algorithm::EdDSA,
            KeyFamily::Rsa => matches!(alg, Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512),
        }
    }
}

/// A key accepted for signature verification.
#[derive(Clone)]
pub struct TrustedKey {
    kid: Option<String>,
    family: KeyFamily,
    pinned_alg: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustedKey")
            .field("kid", &self.kid)
            .field("family", &self.family)
            .field("pinned_alg", &self.pinned_alg)
            .finish_non_exhaustive()
    }
}

impl TrustedKey {
    /// Convert a published JWK, or explain why it cannot be trusted.
    fn from_jwk(jwk: &Jwk) -> Result<Self, &'static str> {
        if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
            return Err("key use is not 'sig'");
        }

        let pinned_alg = match &jwk.alg {
            Some(alg) => Some(
                alg.parse::<Algorithm>()
                    .map_err(|_| "unsupported alg")?,
            ),
            None => None,
        };

        let (family, decoding_key) = match jwk.kty.as_str() {
            "OKP" => {
                if jwk.crv.as_deref().is_some_and(|c| c != "Ed25519") {
                    return Err("unsupported OKP curve");
                }
                let x = jwk.x.as_deref().ok_or("OKP key missing x")?;
                let bytes = decode_ed25519_public_key_jwk(x).map_err(|_| "invalid x encoding")?;
                (KeyFamily::Ed25519, DecodingKey::from_ed_der(&bytes))
            }
            "RSA" => {
                let n = jwk.n.as_deref().ok_or("RSA key missing n")?;
                let e = jwk.e.as_deref().ok_or("RSA key missing e")?;
                let key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|_| "invalid RSA components")?;
                (KeyFamily::Rsa, key)
            }
            _ => return Err("unsupported key type"),
        };

        if let Some(alg) = pinned_alg {
            if !family.supports(alg) {
                return Err("alg does not match key type");
            }
        }

        Ok(Self {
            kid: jwk.kid.clone(),
            family,
            pinned_alg,
            decoding_key,
        })
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Whether this key may verify a signature made with `alg`.
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.family.supports(alg) && self.pinned_alg.map_or(true, |pinned| pinned == alg)
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

/// An immutable snapshot of trusted signing keys.
#[derive(Debug, Clone, Default)]
pub struct JwkSet {
    keys: Vec<TrustedKey>,
}

impl JwkSet {
    /// Parse a JWKS JSON document.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::InvalidDocument` if the JSON does not have the
    /// JWKS shape. Individual unusable keys are skipped, not errors.
    pub fn from_json(json: &str) -> Result<Self, KeySetError> {
        let document: JwksDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(&document))
    }

    pub fn from_document(document: &JwksDocument) -> Self {
        let keys: Vec<TrustedKey> = document
            .keys
            .iter()
            .filter_map(|jwk| match TrustedKey::from_jwk(jwk) {
                Ok(key) => Some(key),
                Err(reason) => {
                    tracing::warn!(
                        target: "fa.auth.jwks",
                        kid = ?jwk.kid,
                        kty = %jwk.kty,
                        reason,
                        "Skipping unusable JWK"
                    );
                    None
                }
            })
            .collect();

        tracing::debug!(target: "fa.auth.jwks", key_count = keys.len(), "JWK set loaded");
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys that may verify a token with the given header.
    ///
    /// With a `kid`, only the key carrying that ID is considered. Without one,
    /// every key compatible with `alg` is.
    pub fn candidates<'a>(
        &'a self,
        kid: Option<&'a str>,
        alg: Algorithm,
    ) -> impl Iterator<Item = &'a TrustedKey> + 'a {
        self.keys.iter().filter(move |key| {
            let kid_matches = match kid {
                Some(kid) => key.kid() == Some(kid),
                None => true,
            };
            kid_matches && key.accepts(alg)
        })
    }
}

/// Supplier of the current trusted key snapshot.
///
/// Implemented by the host's JWKS cache. Each call returns a snapshot that
/// stays valid for the whole verification even if the cache refreshes
/// concurrently.
pub trait KeySource: Send + Sync {
    fn current_keys(&self) -> Arc<JwkSet>;
}

/// A key source that never changes.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    keys: Arc<JwkSet>,
}

impl StaticKeySource {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

impl KeySource for StaticKeySource {
    fn current_keys(&self) -> Arc<JwkSet> {
        Arc::clone(&self.keys)
    }
}
