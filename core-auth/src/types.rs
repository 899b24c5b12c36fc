use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer credential issued by the identity provider.
///
/// Holds the opaque access token together with the scope it was requested
/// for. Expiry is managed by the provider and not tracked locally; a
/// credential is replaced wholesale when the user re-authorizes.
///
/// # Security
///
/// The token is never logged; `Debug` redacts it. Credentials are not
/// serialized and live only as long as the session.
///
/// # Examples
///
/// ```
/// use core_auth::Credential;
///
/// let credential = Credential::new("ya29.a0...", "https://www.googleapis.com/auth/youtube");
/// assert_eq!(credential.access_token(), "ya29.a0...");
/// assert!(!format!("{:?}", credential).contains("ya29"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    scope: String,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            scope: scope.into(),
        }
    }

    /// The raw bearer token, for the `Authorization` header only.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Scope the credential was requested for.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns `true` if the token string is empty.
    pub fn is_empty(&self) -> bool {
        self.access_token.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

/// Lifecycle state of the authorizer.
///
/// # State Transitions
///
/// ```text
/// Unconfigured -> Ready -> AwaitingUser -> Authorized
///                               ^     \
///                               |      -> Unauthorized
///                               |             |
///                               +-------------+
/// ```
///
/// `Authorized` and `Unauthorized` re-enter `AwaitingUser` on the next token
/// request. There is no terminal state.
///
/// # Examples
///
/// ```
/// use core_auth::AuthState;
///
/// assert_eq!(AuthState::default(), AuthState::Unconfigured);
/// assert!(AuthState::Authorized.is_authorized());
/// assert!(AuthState::AwaitingUser.is_in_progress());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    /// No token client has been configured
    #[default]
    Unconfigured,
    /// Token client configured, no request made yet
    Ready,
    /// Consent flow running out of process
    AwaitingUser,
    /// Last request produced a credential
    Authorized,
    /// Last request was denied or failed
    Unauthorized,
}

impl AuthState {
    /// Returns `true` once a credential has been issued.
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthState::Authorized)
    }

    /// Returns `true` while the user has not answered the consent flow.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, AuthState::AwaitingUser)
    }

    /// Returns `true` if a token client is configured.
    pub fn is_configured(&self) -> bool {
        !matches!(self, AuthState::Unconfigured)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Unconfigured => write!(f, "Unconfigured"),
            AuthState::Ready => write!(f, "Ready"),
            AuthState::AwaitingUser => write!(f, "Awaiting User..."),
            AuthState::Authorized => write!(f, "Authorized"),
            AuthState::Unauthorized => write!(f, "Unauthorized"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_accessors() {
        let credential = Credential::new("tok123", "scope-a");
        assert_eq!(credential.access_token(), "tok123");
        assert_eq!(credential.scope(), "scope-a");
        assert!(!credential.is_empty());
        assert!(Credential::new("  ", "scope-a").is_empty());
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = Credential::new("secret_access_token", "scope-a");
        let debug_str = format!("{:?}", credential);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret_access_token"));
        assert!(debug_str.contains("scope-a"));
    }

    #[test]
    fn test_auth_state_helpers() {
        assert!(!AuthState::Unconfigured.is_configured());
        assert!(AuthState::Ready.is_configured());
        assert!(!AuthState::Ready.is_authorized());
        assert!(!AuthState::Unauthorized.is_authorized());
        assert!(AuthState::Authorized.is_authorized());
        assert!(AuthState::AwaitingUser.is_in_progress());
        assert!(!AuthState::Authorized.is_in_progress());
    }

    #[test]
    fn test_auth_state_display() {
        assert_eq!(AuthState::Unconfigured.to_string(), "Unconfigured");
        assert_eq!(AuthState::AwaitingUser.to_string(), "Awaiting User...");
        assert_eq!(AuthState::Authorized.to_string(), "Authorized");
    }

    #[test]
    fn test_auth_state_serialization() {
        let json = serde_json::to_string(&AuthState::Authorized).unwrap();
        let state: AuthState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, AuthState::Authorized);
    }
}
