//! The `ForwardAuth` facade.
//!
//! One instance is built at startup and shared behind `Arc` by every request
//! handler. Each call resolves the application, verifies both tokens, runs
//! the state machine and records metrics.

use crate::application::{Application, ApplicationRegistry};
use crate::auth::jwks::KeySource;
use crate::auth::verifier::{TokenVerifier, Verification};
use crate::authenticator::{self, AccessDecision, AuthenticationOutcome};
use crate::config::Config;
use crate::nonce::{self, NonceMaxAge};
use crate::observability::metrics;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// The transport-agnostic view of one incoming request.
///
/// Token values are redacted in Debug output.
#[derive(Clone, Default)]
pub struct AuthenticateRequest {
    /// Original request host, used to resolve the application.
    pub host: Option<String>,

    /// Original request method.
    pub method: String,

    pub access_token: Option<String>,

    pub id_token: Option<String>,
}

impl fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let presence = |t: &Option<String>| if t.is_some() { "[REDACTED]" } else { "None" };
        f.debug_struct("AuthenticateRequest")
            .field("host", &self.host)
            .field("method", &self.method)
            .field("access_token", &presence(&self.access_token))
            .field("id_token", &presence(&self.id_token))
            .finish()
    }
}

/// Forward-authentication decision core.
pub struct ForwardAuth {
    registry: ApplicationRegistry,
    verifier: TokenVerifier,
    nonce_max_age: NonceMaxAge,
}

impl fmt::Debug for ForwardAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardAuth")
            .field("applications", &self.registry.len())
            .field("nonce_max_age", &self.nonce_max_age.to_string())
            .finish_non_exhaustive()
    }
}

impl ForwardAuth {
    pub fn new(registry: ApplicationRegistry, verifier: TokenVerifier, nonce_max_age: NonceMaxAge) -> Self {
        Self {
            registry,
            verifier,
            nonce_max_age,
        }
    }

    /// Build from loaded configuration and the host's key source.
    pub fn from_config(config: &Config, keys: Arc<dyn KeySource>) -> Self {
        Self::new(
            config.applications.clone(),
            TokenVerifier::new(keys),
            config.nonce_max_age,
        )
    }

    /// Application resolver, used by the login callback.
    pub fn registry(&self) -> &ApplicationRegistry {
        &self.registry
    }

    pub fn nonce_max_age(&self) -> NonceMaxAge {
        self.nonce_max_age
    }

    /// Authenticate against the wall clock.
    pub fn authenticate(&self, request: &AuthenticateRequest) -> AuthenticationOutcome {
        self.authenticate_at(request, Utc::now().timestamp())
    }

    /// Authenticate against an explicit `now` (Unix epoch seconds).
    #[instrument(skip_all, fields(host = ?request.host))]
    pub fn authenticate_at(&self, request: &AuthenticateRequest, now: i64) -> AuthenticationOutcome {
        let app = self.registry.resolve(request.host.as_deref());
        self.authenticate_for(app, request, now)
    }

    /// Authenticate and apply the restricted-method policy.
    pub fn authorize(&self, request: &AuthenticateRequest) -> AccessDecision {
        self.authorize_at(request, Utc::now().timestamp())
    }

    #[instrument(skip_all, fields(host = ?request.host, method = %request.method))]
    pub fn authorize_at(&self, request: &AuthenticateRequest, now: i64) -> AccessDecision {
        let app = self.registry.resolve(request.host.as_deref());
        let outcome = self.authenticate_for(app, request, now);
        let decision = authenticator::authorize(outcome, &request.method, app);

        metrics::record_access_decision(decision.label());
        tracing::debug!(
            target: "fa.service",
            application = %app.name,
            decision = decision.label(),
            "Access decision"
        );
        decision
    }

    /// Whether a login nonce issued at `issued_at` is still fresh at `now`.
    pub fn check_nonce(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let valid = nonce::is_valid(issued_at, now, self.nonce_max_age);
        metrics::record_nonce_check(valid);
        valid
    }

    fn authenticate_for(&self, app: &Application, request: &AuthenticateRequest, now: i64) -> AuthenticationOutcome {
        let access = self
            .verifier
            .verify_at(request.access_token.as_deref(), &app.audience, now);
        let id = self
            .verifier
            .verify_at(request.id_token.as_deref(), &app.client_id, now);

        record_verification("access", &access);
        record_verification("id", &id);

        let outcome = authenticator::authenticate(access, id, app);
        metrics::record_authentication(outcome.label(), outcome.reason().map(|r| r.code()));
        outcome
    }
}

fn record_verification(token: &'static str, verification: &Verification) {
    metrics::record_token_verification(token, verification.label());
}
