//! # Authorization Module
//!
//! Obtains a short-lived bearer credential from a third-party identity
//! provider through the OAuth 2.0 implicit grant.
//!
//! ## Overview
//!
//! The [`Authorizer`] wraps the provider's token-client abstraction, tracks
//! the authorization lifecycle ([`AuthState`]) and re-expresses the provider's
//! callback as a [`TokenRequest`] future that resolves exactly once.
//!
//! ## Features
//!
//! - Token client configuration bound to one client ID and one scope
//! - Non-blocking token requests with single-resolution handles
//! - Guard against overlapping consent flows
//! - Auth state event emission
//!
//! Tokens are never refreshed, revoked or persisted. A new credential is
//! obtained by running the consent flow again.

pub mod authorizer;
pub mod error;
pub mod types;

pub use authorizer::{Authorizer, TokenRequest};
pub use error::{AuthError, Result};
pub use types::{AuthState, Credential};
