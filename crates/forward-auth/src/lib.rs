//! Forward Auth Library
//!
//! This library provides the request-authentication decision core used
//! behind a reverse proxy's forward-auth hook:
//!
//! - Per-host application resolution with default fallback
//! - Access and identity token verification (signature, expiry, audience)
//! - A three-state authentication outcome with permission checks
//! - Projection of identity claims into user-context headers
//! - Login nonce freshness
//!
//! # Architecture
//!
//! ```text
//! service.rs -> application.rs -> auth/verifier.rs -> authenticator.rs -> claims.rs
//! ```
//!
//! HTTP handling, cookies and the OAuth code exchange live in the host
//! process. Signing keys are supplied through [`auth::KeySource`].
//!
//! # Modules
//!
//! - `application` - Application records and the host registry
//! - `auth` - Trusted keys, token verification, verified token type
//! - `authenticator` - Authentication state machine and access policy
//! - `claims` - User-context projection
//! - `config` - Configuration from environment
//! - `errors` - Authentication failure reasons
//! - `nonce` - Login nonce freshness
//! - `observability` - Metrics
//! - `service` - The `ForwardAuth` facade

pub mod application;
pub mod auth;
pub mod authenticator;
pub mod claims;
pub mod config;
pub mod errors;
pub mod nonce;
pub mod observability;
pub mod service;

pub use application::{Application, ApplicationRegistry};
pub use authenticator::{AccessDecision, AuthenticationOutcome};
pub use errors::AuthError;
pub use service::{AuthenticateRequest, ForwardAuth};
