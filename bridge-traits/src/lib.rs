//! # Host Bridge Traits
//!
//! Capability contracts that each host platform implements for the core.
//!
//! ## Overview
//!
//! The core never talks to the network or to an identity provider directly.
//! It depends on the traits in this crate, and the host injects concrete
//! adapters (the desktop adapters live in `bridge-desktop`; tests inject
//! mocks).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - One-shot async HTTP exchange
//! - [`IdentityProvider`](identity::IdentityProvider) - Issues token clients
//!   for the OAuth 2.0 implicit grant
//! - [`TokenClient`](identity::TokenClient) - Starts the interactive consent flow
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Adapters
//! convert platform errors into it and keep the original description in the
//! message so it can be surfaced to the user.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so adapters can be shared behind
//! `Arc` across async tasks.

pub mod error;
pub mod http;
pub mod identity;
pub mod log;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identity::{IdentityProvider, TokenCallback, TokenClient, TokenClientConfig, TokenResponse};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
