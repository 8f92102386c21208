//! # Dashboard Configuration Module
//!
//! Configuration management for the Tarra dashboard core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`DashboardConfig`] instance holding the identity, endpoint and tuning
//! settings the core needs. It enforces fail-fast validation: a deployment
//! with missing identity configuration must fail at startup with an
//! actionable message, never limp along and fail at first sign-in.
//!
//! ## Required Settings
//!
//! - `client_id` - Identity application (client) id
//! - `tenant_id` - Identity tenant id
//! - `redirect_uri` - Where the provider sends the user back after sign-in
//! - `api_base_url` - REST API origin
//! - `stream_url` - Live feed endpoint (ws/wss)
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::DashboardConfig;
//!
//! let config = DashboardConfig::builder()
//!     .client_id("11111111-2222-3333-4444-555555555555")
//!     .tenant_id("66666666-7777-8888-9999-000000000000")
//!     .redirect_uri("https://dashboard.example.com/login")
//!     .api_base_url("https://api.example.com")
//!     .stream_url("wss://api.example.com/ws/live")
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert_eq!(config.routes.default_landing, "/dashboard");
//! ```

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

/// Default sign-in scopes requested during the redirect flow.
pub const DEFAULT_SIGN_IN_SCOPES: &[&str] = &["openid", "profile", "User.Read"];

/// Default seconds before expiry at which a cached token counts as stale.
pub const DEFAULT_TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

/// Well-known route paths the session core navigates between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    /// The sign-in page
    pub sign_in: String,
    /// The application root
    pub root: String,
    /// Where a fresh sign-in lands when no intent is stored
    pub default_landing: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            sign_in: "/login".to_string(),
            root: "/".to_string(),
            default_landing: "/dashboard".to_string(),
        }
    }
}

/// Tuning for outgoing API requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSettings {
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retries after the initial attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Upper bound on a single backoff delay
    pub retry_max_delay: Duration,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
            retry_max_delay: Duration::from_secs(30),
        }
    }
}

/// Dashboard core configuration.
///
/// Use [`DashboardConfig::builder`] to construct instances; `build()`
/// validates everything up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Identity application (client) id
    pub client_id: String,
    /// Identity tenant id
    pub tenant_id: String,
    /// Redirect URI registered with the identity provider
    pub redirect_uri: Url,
    /// REST API origin
    pub api_base_url: Url,
    /// Live feed endpoint
    pub stream_url: Url,
    /// Scopes requested during sign-in
    pub sign_in_scopes: Vec<String>,
    /// Scopes requested for API access tokens
    pub api_scopes: Vec<String>,
    /// Route paths
    pub routes: RoutePaths,
    /// Request tuning
    pub request: RequestSettings,
    /// Seconds before expiry at which a cached token counts as stale
    pub token_refresh_buffer_secs: i64,
}

impl DashboardConfig {
    /// Creates a new builder for constructing a `DashboardConfig`.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Identity authority URL derived from the tenant id.
    pub fn authority(&self) -> String {
        format!("https://login.microsoftonline.com/{}", self.tenant_id)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Identity ids are present
    /// - Endpoint URLs use the expected schemes
    /// - Route paths are absolute
    /// - Retry and timeout settings are within sane bounds
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::Config(
                "Client id cannot be empty. Check the identity configuration for this deployment."
                    .to_string(),
            ));
        }

        if self.tenant_id.trim().is_empty() {
            return Err(Error::Config(
                "Tenant id cannot be empty. Check the identity configuration for this deployment."
                    .to_string(),
            ));
        }

        for (name, url) in [
            ("Redirect URI", &self.redirect_uri),
            ("API base URL", &self.api_base_url),
        ] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "{} must use http or https, got '{}'",
                    name,
                    url.scheme()
                )));
            }
        }

        if !matches!(self.stream_url.scheme(), "ws" | "wss") {
            return Err(Error::Config(format!(
                "Stream URL must use ws or wss, got '{}'",
                self.stream_url.scheme()
            )));
        }

        for (name, path) in [
            ("Sign-in path", &self.routes.sign_in),
            ("Root path", &self.routes.root),
            ("Default landing path", &self.routes.default_landing),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Config(format!(
                    "{} must start with '/', got '{}'",
                    name, path
                )));
            }
        }

        if self.sign_in_scopes.is_empty() {
            return Err(Error::Config("Sign-in scopes cannot be empty".to_string()));
        }

        if self.api_scopes.is_empty() {
            return Err(Error::Config("API scopes cannot be empty".to_string()));
        }

        if self.request.timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        if self.request.max_retries > 10 {
            return Err(Error::Config(
                "Max retries exceeds maximum of 10".to_string(),
            ));
        }

        if self.request.retry_base_delay.is_zero() {
            return Err(Error::Config(
                "Retry base delay must be greater than zero".to_string(),
            ));
        }

        if self.token_refresh_buffer_secs < 0 {
            return Err(Error::Config(
                "Token refresh buffer cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`DashboardConfig`].
#[derive(Debug, Clone, Default)]
pub struct DashboardConfigBuilder {
    client_id: Option<String>,
    tenant_id: Option<String>,
    redirect_uri: Option<String>,
    api_base_url: Option<String>,
    stream_url: Option<String>,
    sign_in_scopes: Option<Vec<String>>,
    api_scopes: Option<Vec<String>>,
    routes: RoutePaths,
    request: RequestSettings,
    token_refresh_buffer_secs: Option<i64>,
}

impl DashboardConfigBuilder {
    /// Sets the identity application (client) id. Required.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the identity tenant id. Required.
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Sets the redirect URI. Required.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Sets the REST API origin. Required.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Sets the live feed endpoint. Required.
    pub fn stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }

    /// Overrides the sign-in scopes.
    pub fn sign_in_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sign_in_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the API scopes. Defaults to `api://{client_id}/access_as_user`.
    pub fn api_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.api_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the route paths.
    pub fn routes(mut self, routes: RoutePaths) -> Self {
        self.routes = routes;
        self
    }

    /// Overrides the request tuning.
    pub fn request(mut self, request: RequestSettings) -> Self {
        self.request = request;
        self
    }

    /// Overrides the token refresh buffer in seconds.
    pub fn token_refresh_buffer_secs(mut self, secs: i64) -> Self {
        self.token_refresh_buffer_secs = Some(secs);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` with an actionable message when a required
    /// setting is missing or malformed.
    pub fn build(self) -> Result<DashboardConfig> {
        let client_id = self.client_id.ok_or_else(|| {
            Error::Config("Client id is required. Use .client_id() to set it.".to_string())
        })?;

        let tenant_id = self.tenant_id.ok_or_else(|| {
            Error::Config("Tenant id is required. Use .tenant_id() to set it.".to_string())
        })?;

        let redirect_uri = parse_url(
            self.redirect_uri.ok_or_else(|| {
                Error::Config(
                    "Redirect URI is required. Use .redirect_uri() to set it.".to_string(),
                )
            })?,
            "redirect URI",
        )?;

        let api_base_url = parse_url(
            self.api_base_url.ok_or_else(|| {
                Error::Config(
                    "API base URL is required. Use .api_base_url() to set it.".to_string(),
                )
            })?,
            "API base URL",
        )?;

        let stream_url = parse_url(
            self.stream_url.ok_or_else(|| {
                Error::Config("Stream URL is required. Use .stream_url() to set it.".to_string())
            })?,
            "stream URL",
        )?;

        let api_scopes = self
            .api_scopes
            .unwrap_or_else(|| vec![format!("api://{}/access_as_user", client_id)]);

        let config = DashboardConfig {
            client_id,
            tenant_id,
            redirect_uri,
            api_base_url,
            stream_url,
            sign_in_scopes: self.sign_in_scopes.unwrap_or_else(|| {
                DEFAULT_SIGN_IN_SCOPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
            api_scopes,
            routes: self.routes,
            request: self.request,
            token_refresh_buffer_secs: self
                .token_refresh_buffer_secs
                .unwrap_or(DEFAULT_TOKEN_REFRESH_BUFFER_SECS),
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_url(raw: String, name: &str) -> Result<Url> {
    Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid {}: '{}' ({})", name, raw, e)))
}
