//! Token handling: trusted keys, verification, and the verified token type.

pub mod jwks;
pub mod token;
pub mod verifier;

pub use jwks::{JwkSet, KeySource, StaticKeySource};
pub use token::{ClaimValue, Token};
pub use verifier::{TokenVerifier, Verification};
