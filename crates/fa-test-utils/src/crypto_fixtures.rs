//! Deterministic Ed25519 keypairs for tests.
//!
//! The same seed always produces the same keypair, so signed fixtures are
//! reproducible across runs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Anything that can sign a test claim set into a compact JWT.
pub trait TokenSigner: std::fmt::Debug {
    /// Sign `claims`, with or without the `kid` header.
    fn sign(&self, claims: &Map<String, Value>, include_kid: bool) -> Result<String, FixtureError>;
}

/// PKCS#8 v1 prefix for an Ed25519 private key (RFC 8410); the 32-byte seed follows.
const ED25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, // SEQUENCE, 46 bytes
    0x02, 0x01, 0x00, // INTEGER 0 (version)
    0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, // AlgorithmIdentifier, OID 1.3.101.112
    0x04, 0x22, 0x04, 0x20, // OCTET STRING { OCTET STRING, 32 bytes }
];

/// An Ed25519 keypair with a key id, able to sign tokens and render its JWK.
#[derive(Clone)]
pub struct TestKeypair {
    kid: String,
    public_key: Vec<u8>,
    private_key_pkcs8: Vec<u8>,
}

impl std::fmt::Debug for TestKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestKeypair")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

impl TestKeypair {
    /// Deterministic keypair for `seed`, published under `kid`.
    ///
    /// # Panics
    ///
    /// Panics if ring rejects the derived seed, which does not happen for
    /// any `u8` input.
    pub fn new(seed: u8, kid: &str) -> Self {
        Self::try_new(seed, kid).expect("deterministic test keypair")
    }

    pub fn try_new(seed: u8, kid: &str) -> Result<Self, FixtureError> {
        let seed_bytes = seed_bytes(seed);
        let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
            .map_err(|e| FixtureError::Crypto(format!("Failed to derive test keypair: {e:?}")))?;

        let mut private_key_pkcs8 = ED25519_PKCS8_PREFIX.to_vec();
        private_key_pkcs8.extend_from_slice(&seed_bytes);

        Ok(Self {
            kid: kid.to_string(),
            public_key: key_pair.public_key().as_ref().to_vec(),
            private_key_pkcs8,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Raw 32-byte public key.
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The public key as an `OKP`/`Ed25519` JWK for a JWKS document.
    pub fn jwk_json(&self) -> Value {
        json!({
            "kty": "OKP",
            "kid": self.kid,
            "crv": "Ed25519",
            "x": URL_SAFE_NO_PAD.encode(&self.public_key),
            "alg": "EdDSA",
            "use": "sig"
        })
    }

    /// A JWKS document containing only this key.
    pub fn jwks_json(&self) -> String {
        json!({ "keys": [self.jwk_json()] }).to_string()
    }
}

impl TokenSigner for TestKeypair {
    fn sign(&self, claims: &Map<String, Value>, include_kid: bool) -> Result<String, FixtureError> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());
        if include_kid {
            header.kid = Some(self.kid.clone());
        }

        let encoding_key = EncodingKey::from_ed_der(&self.private_key_pkcs8);
        Ok(encode(&header, claims, &encoding_key)?)
    }
}

fn seed_bytes(seed: u8) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (i, byte) in (0u8..).zip(bytes.iter_mut()) {
        *byte = if i == 0 {
            seed
        } else {
            seed.wrapping_mul(i).wrapping_add(i)
        };
    }
    bytes
}
