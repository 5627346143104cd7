//! # Forward Auth Test Utilities
//!
//! Shared fixtures for the forward-auth crates:
//! - Deterministic Ed25519 keypairs and their JWK rendering
//! - Fixed RSA keypairs for RS256/RS384/RS512 tokens
//! - A builder for really signed test tokens
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fa_test_utils::*;
//!
//! let keypair = TestKeypair::new(1, "key-1");
//! let jwks = serde_json::json!({ "keys": [keypair.jwk_json()] });
//!
//! let token = TestTokenBuilder::new(&keypair)
//!     .subject("auth0|alice")
//!     .audience("abc123")
//!     .expires_at(now + 3600)
//!     .build();
//! ```

pub mod crypto_fixtures;
pub mod rsa_fixtures;
pub mod token_builders;

pub use crypto_fixtures::*;
pub use rsa_fixtures::*;
pub use token_builders::*;
