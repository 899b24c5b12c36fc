//! Identity Provider Abstraction
//!
//! Models a third-party identity provider's token-client capability: the host
//! configures a client bound to one OAuth client ID and one scope, then asks it
//! to run the interactive consent flow. The result never comes back as a return
//! value; the provider invokes the registered callback once per request.
//!
//! ```text
//! init_token_client(config, callback) ──> TokenClient
//!                                            │ request_access_token()
//!                                            ▼
//!                              consent popup / redirect (out of process)
//!                                            │
//!                                            ▼
//!                              callback(TokenResponse)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::Result;

/// Configuration for a token client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClientConfig {
    /// OAuth client identifier issued by the provider
    pub client_id: String,
    /// Permission scope requested for the token
    pub scope: String,
}

impl TokenClientConfig {
    pub fn new(client_id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            scope: scope.into(),
        }
    }
}

/// Payload delivered to the token callback.
///
/// Mirrors the implicit-grant response: either `access_token` is populated or
/// `error` (and optionally `error_description`) explains the failure.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Successful response carrying an access token.
    pub fn granted(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            token_type: Some("Bearer".to_string()),
            ..Self::default()
        }
    }

    /// Failed response with a provider error code.
    pub fn failed(error: impl Into<String>, description: Option<String>) -> Self {
        Self {
            error: Some(error.into()),
            error_description: description,
            ..Self::default()
        }
    }

    /// The access token, if present and non-empty.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Human-readable reason for a response without a usable token.
    pub fn failure_reason(&self) -> String {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => format!("{}: {}", error, description),
            (Some(error), None) => error.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => "no access token in provider response".to_string(),
        }
    }
}

// Tokens must never reach logs.
impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("error", &self.error)
            .field("error_description", &self.error_description)
            .finish()
    }
}

/// Callback registered with a token client.
pub type TokenCallback = Arc<dyn Fn(TokenResponse) + Send + Sync>;

/// A configured token client.
pub trait TokenClient: Send + Sync {
    /// Start the interactive consent flow.
    ///
    /// Returns immediately; the outcome is delivered to the registered
    /// callback exactly once for this call.
    fn request_access_token(&self);
}

/// Identity provider capable of issuing token clients.
pub trait IdentityProvider: Send + Sync {
    /// Whether the provider's runtime is loaded and usable right now.
    fn is_available(&self) -> bool;

    /// Configure a token client bound to `config` that reports through `callback`.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotAvailable` if the provider runtime is missing.
    fn init_token_client(
        &self,
        config: TokenClientConfig,
        callback: TokenCallback,
    ) -> Result<Box<dyn TokenClient>>;
}
