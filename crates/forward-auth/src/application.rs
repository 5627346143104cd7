//! Per-application configuration and host resolution.
//!
//! Applications are declared as [`ApplicationSettings`] records in which every
//! field except `name` may be left unset. At load time each host-specific
//! record is merged over the default record with [`merge`], and the remaining
//! gaps are filled with documented defaults. The resulting
//! [`ApplicationRegistry`] is immutable and shared by every request.

use common::secret::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// OAuth scope requested when an application does not configure one.
pub const DEFAULT_SCOPE: &str = "profile openid email";

/// Methods that require authentication unless an application narrows the set.
pub const STANDARD_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

/// Name given to the default entry when the configuration leaves it blank.
pub const DEFAULT_APPLICATION_NAME: &str = "default";

/// One application entry as written in configuration.
///
/// `None` means "not configured here": the value is inherited from the
/// default entry, then from the documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSettings {
    /// Host name this entry applies to.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub token_cookie_domain: Option<String>,
    #[serde(default)]
    pub return_to: Option<String>,
    #[serde(default)]
    pub restricted_methods: Option<Vec<String>>,
    #[serde(default)]
    pub required_permissions: Option<Vec<String>>,
    #[serde(default)]
    pub claims: Option<Vec<String>>,
}

/// The `FORWARD_AUTH_APPLICATIONS` document: one default plus host entries.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsDocument {
    pub default: ApplicationSettings,
    #[serde(default)]
    pub applications: Vec<ApplicationSettings>,
}

/// Effective configuration for one application, with every field resolved.
///
/// `client_secret` is redacted in Debug output.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub audience: String,
    pub scope: String,
    pub redirect_uri: String,
    pub token_cookie_domain: String,
    pub return_to: String,
    /// Upper-case HTTP methods that require an authenticated outcome.
    pub restricted_methods: Vec<String>,
    pub required_permissions: Vec<String>,
    /// Claim names projected into user-context headers.
    pub claims: Vec<String>,
}

impl Application {
    /// Whether `method` requires authentication for this application.
    ///
    /// Comparison is ASCII case-insensitive.
    pub fn is_restricted_method(&self, method: &str) -> bool {
        self.restricted_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Merge a host-specific record over the default record.
///
/// Each field takes the specific value if set, then the default entry's value,
/// then the documented default. The name always comes from `specific`.
pub fn merge(specific: &ApplicationSettings, default: &ApplicationSettings) -> Application {
    fn pick<T: Clone>(specific: &Option<T>, default: &Option<T>) -> Option<T> {
        specific.as_ref().or(default.as_ref()).cloned()
    }

    let restricted_methods = pick(&specific.restricted_methods, &default.restricted_methods)
        .map(|methods| ordered_set(methods.iter().map(|m| m.trim().to_ascii_uppercase())))
        .unwrap_or_else(|| STANDARD_METHODS.iter().map(ToString::to_string).collect());

    Application {
        name: specific.name.clone(),
        client_id: pick(&specific.client_id, &default.client_id).unwrap_or_default(),
        client_secret: pick(&specific.client_secret, &default.client_secret)
            .unwrap_or_else(|| SecretString::from("")),
        audience: pick(&specific.audience, &default.audience).unwrap_or_default(),
        scope: pick(&specific.scope, &default.scope).unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        redirect_uri: pick(&specific.redirect_uri, &default.redirect_uri).unwrap_or_default(),
        token_cookie_domain: pick(&specific.token_cookie_domain, &default.token_cookie_domain)
            .unwrap_or_default(),
        return_to: pick(&specific.return_to, &default.return_to).unwrap_or_default(),
        restricted_methods,
        required_permissions: ordered_set(
            pick(&specific.required_permissions, &default.required_permissions)
                .unwrap_or_default(),
        ),
        claims: ordered_set(pick(&specific.claims, &default.claims).unwrap_or_default()),
    }
}

/// Drop duplicates, keeping first occurrence order.
fn ordered_set(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Registry construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Application entry has an empty name")]
    EmptyName,

    #[error("Application '{0}' is configured more than once")]
    DuplicateApplication(String),
}

/// Immutable host → application lookup.
///
/// Built once at startup; `resolve` never fails.
#[derive(Debug, Clone)]
pub struct ApplicationRegistry {
    default: Application,
    applications: HashMap<String, Application>,
}

impl ApplicationRegistry {
    /// Build the registry, merging every entry over the default.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` for blank or duplicate application names.
    pub fn new(
        default: ApplicationSettings,
        applications: Vec<ApplicationSettings>,
    ) -> Result<Self, RegistryError> {
        let mut default = default;
        if default.name.trim().is_empty() {
            default.name = DEFAULT_APPLICATION_NAME.to_string();
        }

        let mut resolved = HashMap::with_capacity(applications.len());
        for settings in &applications {
            if settings.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if resolved.contains_key(&settings.name) {
                return Err(RegistryError::DuplicateApplication(settings.name.clone()));
            }
            resolved.insert(settings.name.clone(), merge(settings, &default));
        }

        let default_application = merge(&default, &ApplicationSettings::default());

        tracing::debug!(
            target: "fa.registry",
            applications = resolved.len(),
            default = %default_application.name,
            "Application registry built"
        );

        Ok(Self {
            default: default_application,
            applications: resolved,
        })
    }

    /// Build the registry from a parsed applications document.
    ///
    /// # Errors
    ///
    /// See [`ApplicationRegistry::new`].
    pub fn from_document(document: ApplicationsDocument) -> Result<Self, RegistryError> {
        Self::new(document.default, document.applications)
    }

    /// Resolve the effective application for a request host.
    ///
    /// Exact, case-sensitive match; unknown or absent hosts get the default.
    pub fn resolve(&self, host: Option<&str>) -> &Application {
        match host.and_then(|h| self.applications.get(h)) {
            Some(app) => app,
            None => {
                tracing::trace!(target: "fa.registry", host = ?host, "Falling back to default application");
                &self.default
            }
        }
    }

    pub fn default_application(&self) -> &Application {
        &self.default
    }

    /// Number of host-specific entries (the default is not counted).
    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applications.is_empty()
    }
}
