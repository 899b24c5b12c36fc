//! # YouTube Provider
//!
//! Subscribes the signed-in account to a channel through the YouTube Data
//! API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Precondition checks that run before any network I/O
//! - Construction of the `subscriptions.insert` request
//! - Translation of HTTP and transport outcomes into [`SubscribeError`]
//!
//! All I/O goes through the injected `HttpClient`, so the requester runs
//! unchanged against the desktop adapter or a test double.

pub mod error;
pub mod requester;
pub mod types;

pub use error::{Precondition, Result, SubscribeError};
pub use requester::{SubscriptionRequester, DEFAULT_FAILURE_MESSAGE};
pub use types::{ChannelId, SubscriptionInsertRequest, CHANNEL_RESOURCE_KIND};
