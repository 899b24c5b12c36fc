//! # Application Configuration
//!
//! Provides configuration management for the subscription core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an `AppConfig`
//! holding the OAuth client identifier, the requested scope and the API
//! endpoint. Values are read once at startup, either explicitly through the
//! builder or from the process environment via [`AppConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `GOOGLE_CLIENT_ID` | OAuth 2.0 web client ID |
//! | `YOYTUBE_CHANNEL_ID` | Channel ID pre-filled into the session |
//! | `YOYTUBE_API_BASE_URL` | Override of the YouTube Data API base URL |
//! | `YOYTUBE_REDIRECT_PORT` | Loopback port for the desktop consent redirect |
//!
//! A missing client ID does not prevent startup. Every authorization attempt
//! will then be rejected by the identity provider.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .google_client_id("1234.apps.googleusercontent.com")
//!     .default_channel_id("UClE78KZQ32HSA_Ff_vo2MuQ")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.scope, "https://www.googleapis.com/auth/youtube");
//! ```

use crate::error::{Error, Result};
use tracing::warn;
use url::Url;

/// OAuth scope granting write access to the user's YouTube account.
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube";

/// YouTube Data API v3 base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Default loopback port for the desktop consent redirect.
pub const DEFAULT_REDIRECT_PORT: u16 = 8080;

pub const ENV_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const ENV_CHANNEL_ID: &str = "YOYTUBE_CHANNEL_ID";
pub const ENV_API_BASE_URL: &str = "YOYTUBE_API_BASE_URL";
pub const ENV_REDIRECT_PORT: &str = "YOYTUBE_REDIRECT_PORT";

/// Application configuration.
///
/// Use [`AppConfigBuilder`] or [`AppConfig::from_env`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// OAuth client identifier (absent when not configured)
    pub google_client_id: Option<String>,

    /// Permission scope requested for the bearer credential
    pub scope: String,

    /// Base URL of the YouTube Data API
    pub api_base_url: String,

    /// Channel ID to pre-fill into the session, if any
    pub default_channel_id: Option<String>,

    /// Loopback port used by the desktop identity provider
    pub redirect_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            scope: YOUTUBE_SCOPE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_channel_id: None,
            redirect_port: DEFAULT_REDIRECT_PORT,
        }
    }
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is present but malformed
    /// (e.g. a non-numeric redirect port or a non-HTTP base URL).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = AppConfig::builder();

        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            builder = builder.google_client_id(client_id);
        }

        if let Some(channel_id) = lookup(ENV_CHANNEL_ID) {
            builder = builder.default_channel_id(channel_id);
        }

        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            builder = builder.api_base_url(base_url);
        }

        if let Some(port) = lookup(ENV_REDIRECT_PORT) {
            let port = port.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("{} must be a port number: {}", ENV_REDIRECT_PORT, e))
            })?;
            builder = builder.redirect_port(port);
        }

        let config = builder.build()?;

        if config.google_client_id.is_none() {
            warn!(
                variable = ENV_CLIENT_ID,
                "No OAuth client ID configured; authorization attempts will be rejected"
            );
        }

        Ok(config)
    }

    /// Returns `true` when an OAuth client ID is configured.
    pub fn has_client_id(&self) -> bool {
        self.google_client_id.is_some()
    }

    /// The client ID to hand to the identity provider (empty when absent).
    pub fn client_id_or_empty(&self) -> &str {
        self.google_client_id.as_deref().unwrap_or_default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The scope is not empty
    /// - The API base URL parses and uses `http` or `https`
    pub fn validate(&self) -> Result<()> {
        if self.scope.trim().is_empty() {
            return Err(Error::Config("OAuth scope cannot be empty".to_string()));
        }

        let url = Url::parse(&self.api_base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "API base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        Ok(())
    }
}

/// Builder for constructing [`AppConfig`] instances.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    google_client_id: Option<String>,
    scope: Option<String>,
    api_base_url: Option<String>,
    default_channel_id: Option<String>,
    redirect_port: Option<u16>,
}

impl AppConfigBuilder {
    /// Sets the OAuth client ID. Blank values count as absent.
    pub fn google_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.google_client_id = non_blank(client_id.into());
        self
    }

    /// Overrides the requested scope.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Overrides the API base URL. A trailing slash is dropped.
    pub fn api_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api_base_url = Some(base_url.trim().trim_end_matches('/').to_string());
        self
    }

    /// Sets the channel ID to pre-fill. Blank values count as absent.
    pub fn default_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.default_channel_id = non_blank(channel_id.into());
        self
    }

    /// Sets the loopback redirect port.
    pub fn redirect_port(mut self, port: u16) -> Self {
        self.redirect_port = Some(port);
        self
    }

    /// Builds the final `AppConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if validation fails.
    pub fn build(self) -> Result<AppConfig> {
        let defaults = AppConfig::default();

        let config = AppConfig {
            google_client_id: self.google_client_id,
            scope: self.scope.unwrap_or(defaults.scope),
            api_base_url: self.api_base_url.unwrap_or(defaults.api_base_url),
            default_channel_id: self.default_channel_id,
            redirect_port: self.redirect_port.unwrap_or(defaults.redirect_port),
        };

        config.validate()?;

        Ok(config)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
