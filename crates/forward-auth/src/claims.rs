//! Projection of identity-token claims into user-context values.
//!
//! The transport layer turns each entry into one outbound header for the
//! upstream application.

use crate::auth::token::Token;
use std::collections::HashMap;

/// Claim name to rendered value.
pub type UserContext = HashMap<String, String>;

/// Keep the claims named in `allowed`, rendered to strings.
///
/// Claims whose shape cannot be rendered (floats, objects, null, mixed
/// arrays) are dropped without error.
pub fn project(id_token: &Token, allowed: &[String]) -> UserContext {
    let context: UserContext = id_token
        .claims()
        .iter()
        .filter(|(name, _)| allowed.contains(name))
        .filter_map(|(name, value)| match value.render() {
            Some(rendered) => Some((name.clone(), rendered)),
            None => {
                tracing::trace!(target: "fa.claims", claim = %name, "Dropping claim with unsupported shape");
                None
            }
        })
        .collect();

    tracing::trace!(
        target: "fa.claims",
        allowed = allowed.len(),
        projected = context.len(),
        "Projected identity claims"
    );
    context
}
