//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the subscription core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the other crates depend on.
//! It establishes the logging conventions, the configuration surface read at
//! startup and the event broadcasting used to report auth and subscription
//! progress to hosts.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
