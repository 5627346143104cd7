//! Authentication state machine and access policy.
//!
//! [`authenticate`] is a pure function of both verification results and the
//! resolved application. Cryptographic validity is settled by the verifier
//! before any policy is looked at, so a verified-but-unauthorized subject is
//! always reported as `PermissionDenied`, never as a token failure.
//!
//! [`authorize`] layers the restricted-method rule on top of the outcome.

use crate::application::Application;
use crate::auth::token::Token;
use crate::auth::verifier::Verification;
use crate::claims::{project, UserContext};
use crate::errors::AuthError;

/// The three-state result of authenticating one request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationOutcome {
    /// No credentials were presented.
    Anonymous,

    /// Both tokens verified and the application's permissions are satisfied.
    Authenticated {
        access_token: Token,
        id_token: Token,
        user_context: UserContext,
    },

    Error { reason: AuthError },
}

impl AuthenticationOutcome {
    /// Label used for metrics: `anonymous`, `authenticated`, or `error`.
    pub fn label(&self) -> &'static str {
        match self {
            AuthenticationOutcome::Anonymous => "anonymous",
            AuthenticationOutcome::Authenticated { .. } => "authenticated",
            AuthenticationOutcome::Error { .. } => "error",
        }
    }

    pub fn reason(&self) -> Option<AuthError> {
        match self {
            AuthenticationOutcome::Error { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// Classify a request from its two verification results.
///
/// Rules, in order:
/// 1. Neither token supplied - `Anonymous`
/// 2. Identity token supplied but invalid - its reason
/// 3. Access token supplied but invalid - its reason
/// 4. Exactly one token supplied - `IncompleteCredentialSet`
/// 5. Both valid, required permissions missing - `PermissionDenied`
/// 6. Otherwise - `Authenticated`, with projected claims
pub fn authenticate(
    access: Verification,
    id: Verification,
    app: &Application,
) -> AuthenticationOutcome {
    let outcome = match (access, id) {
        (Verification::NoToken, Verification::NoToken) => AuthenticationOutcome::Anonymous,

        (_, Verification::Invalid(reason)) => {
            tracing::debug!(target: "fa.authenticator", token = "id", reason = reason.code(), "Identity token rejected");
            AuthenticationOutcome::Error { reason }
        }

        (Verification::Invalid(reason), _) => {
            tracing::debug!(target: "fa.authenticator", token = "access", reason = reason.code(), "Access token rejected");
            AuthenticationOutcome::Error { reason }
        }

        (Verification::Valid(_), Verification::NoToken)
        | (Verification::NoToken, Verification::Valid(_)) => {
            tracing::debug!(target: "fa.authenticator", "Only one of access and identity token supplied");
            AuthenticationOutcome::Error {
                reason: AuthError::IncompleteCredentialSet,
            }
        }

        (Verification::Valid(access_token), Verification::Valid(id_token)) => {
            if !id_token.has_permissions(&app.required_permissions) {
                tracing::debug!(
                    target: "fa.authenticator",
                    application = %app.name,
                    required = ?app.required_permissions,
                    "Required permissions not granted"
                );
                AuthenticationOutcome::Error {
                    reason: AuthError::PermissionDenied,
                }
            } else {
                let user_context = project(&id_token, &app.claims);
                AuthenticationOutcome::Authenticated {
                    access_token,
                    id_token,
                    user_context,
                }
            }
        }
    };

    tracing::debug!(
        target: "fa.authenticator",
        application = %app.name,
        state = outcome.label(),
        reason = outcome.reason().map(|r| r.code()),
        "Authentication state"
    );
    outcome
}

/// What the proxy should do with the request.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    /// Anonymous request on a method outside the restricted set.
    Allow,

    /// Authenticated request; forward `user_context` as headers.
    AllowAuthenticated { user_context: UserContext },

    /// Send the user to the identity provider's login.
    LoginRequired { reason: Option<AuthError> },

    /// Authenticated but not permitted; a new login would not help.
    Forbidden { reason: AuthError },
}

impl AccessDecision {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            AccessDecision::Allow => "allow",
            AccessDecision::AllowAuthenticated { .. } => "allow_authenticated",
            AccessDecision::LoginRequired { .. } => "login_required",
            AccessDecision::Forbidden { .. } => "forbidden",
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(
            self,
            AccessDecision::Allow | AccessDecision::AllowAuthenticated { .. }
        )
    }
}

/// Apply the restricted-method rule to an outcome.
///
/// Anonymous requests pass only on methods outside the application's
/// restricted set. Credential failures never pass.
pub fn authorize(outcome: AuthenticationOutcome, method: &str, app: &Application) -> AccessDecision {
    match outcome {
        AuthenticationOutcome::Authenticated { user_context, .. } => {
            AccessDecision::AllowAuthenticated { user_context }
        }
        AuthenticationOutcome::Anonymous => {
            if app.is_restricted_method(method) {
                AccessDecision::LoginRequired { reason: None }
            } else {
                AccessDecision::Allow
            }
        }
        AuthenticationOutcome::Error { reason } => {
            if reason.is_recoverable_by_login() {
                AccessDecision::LoginRequired {
                    reason: Some(reason),
                }
            } else {
                AccessDecision::Forbidden { reason }
            }
        }
    }
}
