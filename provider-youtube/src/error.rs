//! Error types for the YouTube provider

use std::fmt;
use thiserror::Error;

/// Input that must be present before a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No bearer credential (or an empty one)
    Credential,
    /// Channel identifier empty after trimming
    ChannelId,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Credential => write!(f, "missing credential"),
            Precondition::ChannelId => write!(f, "missing channel identifier"),
        }
    }
}

/// Subscription request failures.
///
/// `Display` yields the user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscribeError {
    /// A precondition failed; no request was sent
    #[error("{0}")]
    MissingPrecondition(Precondition),

    /// The API answered with a non-success status
    #[error("{message}")]
    HttpFailure { status: u16, message: String },

    /// The request never produced a response
    #[error("{0}")]
    TransportFault(String),
}

impl SubscribeError {
    /// Message suitable for a status line.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status, when the API answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            SubscribeError::HttpFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request was rejected before any network I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SubscribeError::MissingPrecondition(_))
    }
}

/// Result type for YouTube operations
pub type Result<T> = std::result::Result<T, SubscribeError>;
