//! Forward-auth configuration.
//!
//! Configuration is loaded from environment variables. Application client
//! secrets are held as `SecretString` and never appear in Debug output.

use crate::application::{ApplicationRegistry, ApplicationsDocument, RegistryError};
use crate::nonce::NonceMaxAge;
use common::config::ObservabilityConfig;
use std::collections::HashMap;
use std::env;
use std::fmt;
use thiserror::Error;

/// Environment variable holding the applications JSON document.
pub const APPLICATIONS_VAR: &str = "FORWARD_AUTH_APPLICATIONS";

/// Identity-provider endpoints used by the login and logout flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    /// Identity-provider domain, e.g. "tenant.eu.auth0.com".
    pub domain: String,

    pub authorize_url: String,

    pub token_endpoint: String,

    pub userinfo_endpoint: String,

    pub logout_endpoint: String,
}

impl ProviderEndpoints {
    fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let domain = vars
            .get("AUTH_DOMAIN")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_DOMAIN".to_string()))?
            .trim()
            .to_string();

        let endpoint = |var: &str, path: &str| {
            vars.get(var)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| format!("https://{domain}{path}"))
        };

        Ok(Self {
            authorize_url: endpoint("AUTH_AUTHORIZE_URL", "/authorize"),
            token_endpoint: endpoint("AUTH_TOKEN_ENDPOINT", "/oauth/token"),
            userinfo_endpoint: endpoint("AUTH_USERINFO_ENDPOINT", "/userinfo"),
            logout_endpoint: endpoint("AUTH_LOGOUT_ENDPOINT", "/v2/logout"),
            domain,
        })
    }
}

/// Forward-auth process configuration.
#[derive(Clone)]
pub struct Config {
    pub provider: ProviderEndpoints,

    /// Nonce freshness window for the login callback (default: 60s).
    pub nonce_max_age: NonceMaxAge,

    /// Resolved applications, each already merged over the default.
    pub applications: ApplicationRegistry,

    pub observability: ObservabilityConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("nonce_max_age", &self.nonce_max_age.to_string())
            .field("applications", &self.applications.len())
            .field(
                "default_application",
                &self.applications.default_application().name,
            )
            .field("observability", &self.observability)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid nonce max age configuration: {0}")]
    InvalidNonceMaxAge(String),

    #[error("Invalid applications configuration: {0}")]
    InvalidApplications(String),

    #[error("Invalid application registry: {0}")]
    Registry(#[from] RegistryError),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a variable map.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing, the
    /// nonce max age is not an integer `>= -1`, or the applications
    /// document does not parse into a valid registry.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let provider = ProviderEndpoints::from_vars(vars)?;

        let nonce_max_age = if let Some(value_str) = vars.get("NONCE_MAX_AGE") {
            let value: i64 = value_str.trim().parse().map_err(|e| {
                ConfigError::InvalidNonceMaxAge(format!(
                    "NONCE_MAX_AGE must be a valid integer, got '{value_str}': {e}"
                ))
            })?;
            NonceMaxAge::new(value).map_err(|e| ConfigError::InvalidNonceMaxAge(e.to_string()))?
        } else {
            NonceMaxAge::default()
        };

        let raw = vars
            .get(APPLICATIONS_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(APPLICATIONS_VAR.to_string()))?;
        let document: ApplicationsDocument = serde_json::from_str(raw).map_err(|e| {
            ConfigError::InvalidApplications(format!("{APPLICATIONS_VAR} is not a valid document: {e}"))
        })?;
        let applications = ApplicationRegistry::from_document(document)?;

        let observability = ObservabilityConfig::from_vars(vars);

        tracing::info!(
            target: "fa.service",
            domain = %provider.domain,
            nonce_max_age = %nonce_max_age,
            applications = applications.len(),
            "Configuration loaded"
        );

        Ok(Self {
            provider,
            nonce_max_age,
            applications,
            observability,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    const APPLICATIONS: &str = r#"{
        "default": {
            "name": "",
            "clientId": "default-client",
            "clientSecret": "default-secret",
            "audience": "https://api.example.com",
            "redirectUri": "https://auth.example.com/signin"
        },
        "applications": [
            {
                "name": "app.example.com",
                "clientId": "abc123",
                "restrictedMethods": ["post", "delete"],
                "claims": ["email"]
            }
        ]
    }"#;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            ("AUTH_DOMAIN".to_string(), "tenant.example.com".to_string()),
            (APPLICATIONS_VAR.to_string(), APPLICATIONS.to_string()),
        ])
    }

    #[test]
    fn test_from_vars_with_defaults() {
        let config = Config::from_vars(&base_vars()).unwrap();

        assert_eq!(config.provider.domain, "tenant.example.com");
        assert_eq!(
            config.provider.authorize_url,
            "https://tenant.example.com/authorize"
        );
        assert_eq!(
            config.provider.token_endpoint,
            "https://tenant.example.com/oauth/token"
        );
        assert_eq!(
            config.provider.userinfo_endpoint,
            "https://tenant.example.com/userinfo"
        );
        assert_eq!(
            config.provider.logout_endpoint,
            "https://tenant.example.com/v2/logout"
        );
        assert_eq!(config.nonce_max_age, NonceMaxAge::default());
        assert_eq!(config.applications.len(), 1);
        assert_eq!(config.observability, ObservabilityConfig::default());
    }

    #[test]
    fn test_endpoint_overrides() {
        let mut vars = base_vars();
        vars.insert(
            "AUTH_AUTHORIZE_URL".to_string(),
            "https://login.example.com/authorize".to_string(),
        );

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(
            config.provider.authorize_url,
            "https://login.example.com/authorize"
        );
        assert_eq!(
            config.provider.token_endpoint,
            "https://tenant.example.com/oauth/token"
        );
    }

    #[test]
    fn test_applications_are_merged_over_default() {
        let config = Config::from_vars(&base_vars()).unwrap();

        let app = config.applications.resolve(Some("app.example.com"));
        assert_eq!(app.client_id, "abc123");
        assert_eq!(app.audience, "https://api.example.com");
        assert_eq!(app.client_secret.expose_secret(), "default-secret");
        assert_eq!(app.restricted_methods, vec!["POST", "DELETE"]);

        let fallback = config.applications.resolve(Some("unknown.example.com"));
        assert_eq!(fallback.name, "default");
        assert_eq!(fallback.client_id, "default-client");
    }

    #[test]
    fn test_missing_domain() {
        let mut vars = base_vars();
        vars.remove("AUTH_DOMAIN");

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "AUTH_DOMAIN"));
    }

    #[test]
    fn test_missing_applications() {
        let mut vars = base_vars();
        vars.remove(APPLICATIONS_VAR);

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == APPLICATIONS_VAR));
    }

    #[test]
    fn test_unparsable_applications() {
        let mut vars = base_vars();
        vars.insert(APPLICATIONS_VAR.to_string(), "{not json".to_string());

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidApplications(_)));
    }

    #[test]
    fn test_duplicate_application_names() {
        let mut vars = base_vars();
        vars.insert(
            APPLICATIONS_VAR.to_string(),
            r#"{"default":{"name":""},"applications":[{"name":"a"},{"name":"a"}]}"#.to_string(),
        );

        let err = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Registry(RegistryError::DuplicateApplication(ref n)) if n == "a"
        ));
    }

    #[test]
    fn test_nonce_max_age_values() {
        let mut vars = base_vars();

        vars.insert("NONCE_MAX_AGE".to_string(), "-1".to_string());
        assert!(Config::from_vars(&vars).unwrap().nonce_max_age.is_disabled());

        vars.insert("NONCE_MAX_AGE".to_string(), "300".to_string());
        assert_eq!(Config::from_vars(&vars).unwrap().nonce_max_age.seconds(), 300);

        vars.insert("NONCE_MAX_AGE".to_string(), "-2".to_string());
        assert!(matches!(
            Config::from_vars(&vars).unwrap_err(),
            ConfigError::InvalidNonceMaxAge(_)
        ));

        vars.insert("NONCE_MAX_AGE".to_string(), "soon".to_string());
        let err = Config::from_vars(&vars).unwrap_err();
        assert!(err.to_string().contains("NONCE_MAX_AGE must be a valid integer"));
    }

    #[test]
    fn test_debug_redacts_client_secrets() {
        let config = Config::from_vars(&base_vars()).unwrap();
        let debug_output = format!("{config:?}");

        assert!(!debug_output.contains("default-secret"));
        assert!(debug_output.contains("tenant.example.com"));
    }
}
