//! Interactive session state.
//!
//! One `Session` per signed-in window. It is owned by [`CoreService`](crate::CoreService)
//! and only mutated by its operations.

use core_auth::Credential;

/// User-facing status lines.
pub mod status {
    pub const PROVIDER_NOT_LOADED: &str =
        "Google Identity script not loaded. Please refresh the page.";
    pub const SIGNED_IN: &str = "Signed in with Google. You can now subscribe to channels.";
    pub const TOKEN_FAILED: &str = "Failed to obtain access token.";
    pub const SIGN_IN_PENDING: &str = "Sign-in already in progress.";
    pub const SIGN_IN_REQUIRED: &str = "You must sign in with Google first.";
    pub const CHANNEL_REQUIRED: &str = "Please enter a channel ID.";
    pub const SUBSCRIBED: &str = "Successfully subscribed to the channel!";

    /// Status line for a failed subscription request.
    pub fn subscribe_failed(message: &str) -> String {
        format!("Error: {}", message)
    }
}

/// Button captions.
pub mod labels {
    pub const SIGN_IN: &str = "Sign in with Google";
    pub const REAUTHORIZE: &str = "Re-authorize Google";
    pub const SUBSCRIBE: &str = "Subscribe to Channel";
    pub const SUBSCRIBING: &str = "Subscribing...";
}

/// Transient state of one interactive session.
///
/// Nothing here is persisted; dropping the session forgets the credential.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Bearer credential from the last successful sign-in
    pub credential: Option<Credential>,
    /// A subscription request is in flight
    pub busy: bool,
    /// Last status line shown to the user
    pub message: Option<String>,
    /// Channel ID as typed by the user
    pub channel_input: String,
}

impl Session {
    pub fn new(channel_input: impl Into<String>) -> Self {
        Self {
            channel_input: channel_input.into(),
            ..Self::default()
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential.is_some()
    }

    /// The subscribe control is enabled only when signed in and idle.
    pub fn can_subscribe(&self) -> bool {
        self.is_signed_in() && !self.busy
    }

    pub fn sign_in_label(&self) -> &'static str {
        if self.is_signed_in() {
            labels::REAUTHORIZE
        } else {
            labels::SIGN_IN
        }
    }

    pub fn subscribe_label(&self) -> &'static str {
        if self.busy {
            labels::SUBSCRIBING
        } else {
            labels::SUBSCRIBE
        }
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }
}
