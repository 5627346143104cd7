//! Verified token representation.
//!
//! A [`Token`] is only constructed by the verifier, after the token has been
//! structurally parsed and its signature checked. The subject and the raw
//! token string are redacted in Debug output to prevent exposure in logs.

use crate::errors::AuthError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Claim carrying the subject's granted permissions.
pub const PERMISSIONS_CLAIM: &str = "permissions";

/// A claim value of one of the shapes the projector knows how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimValue {
    String(String),
    Bool(bool),
    Integer(i64),
    StringArray(Vec<String>),
    /// Floats, objects, null, and arrays with non-string elements.
    Unsupported(Value),
}

impl From<Value> for ClaimValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ClaimValue::String(s),
            Value::Bool(b) => ClaimValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ClaimValue::Integer(i),
                None => ClaimValue::Unsupported(Value::Number(n)),
            },
            Value::Array(items) => {
                if items.iter().all(Value::is_string) {
                    ClaimValue::StringArray(
                        items
                            .into_iter()
                            .filter_map(|v| match v {
                                Value::String(s) => Some(s),
                                _ => None,
                            })
                            .collect(),
                    )
                } else {
                    ClaimValue::Unsupported(Value::Array(items))
                }
            }
            other => ClaimValue::Unsupported(other),
        }
    }
}

impl ClaimValue {
    /// Render to a header-safe string, or `None` for unsupported shapes.
    ///
    /// String arrays are joined with `", "`, preserving element order.
    pub fn render(&self) -> Option<String> {
        match self {
            ClaimValue::StringArray(items) => Some(items.join(", ")),
            ClaimValue::Bool(b) => Some(b.to_string()),
            ClaimValue::String(s) => Some(s.clone()),
            ClaimValue::Integer(i) => Some(i.to_string()),
            ClaimValue::Unsupported(_) => None,
        }
    }
}

/// A parsed, signature-verified JWT.
#[derive(Clone, PartialEq)]
pub struct Token {
    raw: String,
    subject: String,
    issuer: Option<String>,
    audience: Vec<String>,
    expires_at: i64,
    issued_at: Option<i64>,
    claims: HashMap<String, ClaimValue>,
}

/// Custom Debug implementation that redacts `subject` and `raw`.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("raw", &"[REDACTED]")
            .field("subject", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expires_at", &self.expires_at)
            .field("issued_at", &self.issued_at)
            .field("claims", &self.claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Token {
    /// Build a token from a decoded payload.
    ///
    /// `sub` must be a string and `exp` an integer; `aud` may be a single
    /// string or an array of strings. Anything else is `Malformed`.
    pub(crate) fn from_claims(
        raw: &str,
        claims: serde_json::Map<String, Value>,
    ) -> Result<Self, AuthError> {
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or(AuthError::Malformed)?;

        let expires_at = claims
            .get("exp")
            .and_then(Value::as_i64)
            .ok_or(AuthError::Malformed)?;

        let issuer = match claims.get("iss") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(AuthError::Malformed),
        };

        let issued_at = match claims.get("iat") {
            None => None,
            Some(v) => Some(v.as_i64().ok_or(AuthError::Malformed)?),
        };

        let audience = match claims.get("aud") {
            None => Vec::new(),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(ToString::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or(AuthError::Malformed)?,
            Some(_) => return Err(AuthError::Malformed),
        };

        let claims = claims
            .into_iter()
            .map(|(name, value)| (name, ClaimValue::from(value)))
            .collect();

        Ok(Self {
            raw: raw.to_string(),
            subject,
            issuer,
            audience,
            expires_at,
            issued_at,
            claims,
        })
    }

    /// The compact token string as presented by the client.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Expiry as Unix epoch seconds.
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Issued-at as Unix epoch seconds, when present.
    pub fn issued_at(&self) -> Option<i64> {
        self.issued_at
    }

    pub fn claims(&self) -> &HashMap<String, ClaimValue> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get(name)
    }

    pub fn has_audience(&self, audience: &str) -> bool {
        self.audience.iter().any(|a| a == audience)
    }

    /// Permissions granted by the `permissions` claim.
    ///
    /// Accepts an array of strings or a space-separated string; any other
    /// shape grants nothing.
    pub fn permissions(&self) -> Vec<&str> {
        match self.claims.get(PERMISSIONS_CLAIM) {
            Some(ClaimValue::StringArray(items)) => items.iter().map(String::as_str).collect(),
            Some(ClaimValue::String(s)) => s.split_whitespace().collect(),
            _ => Vec::new(),
        }
    }

    /// Whether every permission in `required` is granted.
    pub fn has_permissions(&self, required: &[String]) -> bool {
        let granted = self.permissions();
        required.iter().all(|r| granted.contains(&r.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("claims fixture must be an object"),
        }
    }

    fn token(value: Value) -> Token {
        Token::from_claims("raw.token.value", claims(value)).unwrap()
    }

    #[test]
    fn test_claim_value_shapes() {
        assert_eq!(ClaimValue::from(json!("a")), ClaimValue::String("a".into()));
        assert_eq!(ClaimValue::from(json!(true)), ClaimValue::Bool(true));
        assert_eq!(ClaimValue::from(json!(42)), ClaimValue::Integer(42));
        assert_eq!(
            ClaimValue::from(json!(["a", "b"])),
            ClaimValue::StringArray(vec!["a".into(), "b".into()])
        );
        assert!(matches!(ClaimValue::from(json!(1.5)), ClaimValue::Unsupported(_)));
        assert!(matches!(ClaimValue::from(json!(["a", 1])), ClaimValue::Unsupported(_)));
        assert!(matches!(ClaimValue::from(json!({"k": "v"})), ClaimValue::Unsupported(_)));
        assert!(matches!(ClaimValue::from(Value::Null), ClaimValue::Unsupported(_)));
    }

    #[test]
    fn test_render() {
        assert_eq!(ClaimValue::from(json!(["x", "y", "z"])).render().unwrap(), "x, y, z");
        assert_eq!(ClaimValue::from(json!(false)).render().unwrap(), "false");
        assert_eq!(ClaimValue::from(json!("a@b.com")).render().unwrap(), "a@b.com");
        assert_eq!(ClaimValue::from(json!(-7)).render().unwrap(), "-7");
        assert_eq!(ClaimValue::from(json!([])).render().unwrap(), "");
        assert!(ClaimValue::from(json!(2.5)).render().is_none());
    }

    #[test]
    fn test_from_claims_reads_registered_claims() {
        let t = token(json!({
            "sub": "auth0|123",
            "iss": "https://tenant.example.com/",
            "aud": ["https://api", "abc123"],
            "exp": 2000,
            "iat": 1000,
            "email": "a@b.com"
        }));

        assert_eq!(t.subject(), "auth0|123");
        assert_eq!(t.issuer(), Some("https://tenant.example.com/"));
        assert_eq!(t.audience(), ["https://api", "abc123"]);
        assert_eq!(t.expires_at(), 2000);
        assert_eq!(t.issued_at(), Some(1000));
        assert!(t.has_audience("abc123"));
        assert!(!t.has_audience("other"));
        assert_eq!(t.claim("email"), Some(&ClaimValue::String("a@b.com".into())));
        assert_eq!(t.as_str(), "raw.token.value");
    }

    #[test]
    fn test_single_string_audience() {
        let t = token(json!({"sub": "s", "exp": 1, "aud": "abc123"}));
        assert_eq!(t.audience(), ["abc123"]);
    }

    #[test]
    fn test_missing_required_claims_are_malformed() {
        let missing_sub = Token::from_claims("r", claims(json!({"exp": 1})));
        assert_eq!(missing_sub.unwrap_err(), AuthError::Malformed);

        let missing_exp = Token::from_claims("r", claims(json!({"sub": "s"})));
        assert_eq!(missing_exp.unwrap_err(), AuthError::Malformed);

        let string_exp = Token::from_claims("r", claims(json!({"sub": "s", "exp": "soon"})));
        assert_eq!(string_exp.unwrap_err(), AuthError::Malformed);

        let bad_aud = Token::from_claims("r", claims(json!({"sub": "s", "exp": 1, "aud": [1]})));
        assert_eq!(bad_aud.unwrap_err(), AuthError::Malformed);
    }

    #[test]
    fn test_permissions_from_array_and_string() {
        let array = token(json!({"sub": "s", "exp": 1, "permissions": ["read", "admin"]}));
        assert_eq!(array.permissions(), vec!["read", "admin"]);
        assert!(array.has_permissions(&["admin".to_string()]));
        assert!(!array.has_permissions(&["admin".to_string(), "write".to_string()]));

        let spaced = token(json!({"sub": "s", "exp": 1, "permissions": "read write"}));
        assert!(spaced.has_permissions(&["write".to_string(), "read".to_string()]));

        let none = token(json!({"sub": "s", "exp": 1}));
        assert!(none.permissions().is_empty());
        assert!(none.has_permissions(&[]));
    }

    #[test]
    fn test_debug_redacts_subject_and_raw() {
        let t = token(json!({"sub": "secret-user-id", "exp": 1}));
        let debug_str = format!("{t:?}");

        assert!(!debug_str.contains("secret-user-id"));
        assert!(!debug_str.contains("raw.token.value"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
