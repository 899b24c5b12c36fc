//! Channel subscription requester
//!
//! Issues the single authenticated `subscriptions.insert` call and folds
//! every outcome into a [`Result`].

use bridge_traits::error::BridgeError;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use core_auth::Credential;
use core_runtime::config::DEFAULT_API_BASE_URL;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Precondition, Result, SubscribeError};
use crate::types::{ApiErrorResponse, ChannelId, SubscriptionInsertRequest, SubscriptionResource};

/// Message used when a failed response carries no readable error.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to subscribe to channel.";

/// YouTube Data API subscription requester
///
/// Performs exactly one outbound request per [`subscribe`](Self::subscribe)
/// call. There is no retry and no timeout override; the request runs until
/// the `HttpClient` returns.
///
/// # Example
///
/// ```ignore
/// use provider_youtube::SubscriptionRequester;
///
/// let requester = SubscriptionRequester::new(http_client);
/// requester.subscribe(Some(&credential), "UClE78KZQ32HSA_Ff_vo2MuQ").await?;
/// ```
pub struct SubscriptionRequester {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// API base URL without trailing slash
    base_url: String,
}

impl SubscriptionRequester {
    /// Create a requester against the public YouTube Data API.
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the requester at another API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn subscriptions_url(&self) -> String {
        format!("{}/subscriptions?part=snippet", self.base_url)
    }

    /// Subscribe the credential's account to `channel_id`.
    ///
    /// Preconditions are checked before any I/O:
    /// 1. a non-empty credential, else `MissingPrecondition(Credential)`
    /// 2. a channel ID that is non-empty after trimming, else
    ///    `MissingPrecondition(ChannelId)`
    ///
    /// Any 2xx status is a success whatever the body says. Other statuses
    /// become `HttpFailure` with the API's `error.message`, or
    /// [`DEFAULT_FAILURE_MESSAGE`] if the body has none. Transport errors become
    /// `TransportFault`.
    #[instrument(skip(self, credential, channel_id), fields(channel_id = %channel_id.trim()))]
    pub async fn subscribe(&self, credential: Option<&Credential>, channel_id: &str) -> Result<()> {
        let credential = credential
            .filter(|credential| !credential.is_empty())
            .ok_or(SubscribeError::MissingPrecondition(Precondition::Credential))?;

        let channel_id = ChannelId::parse(channel_id)
            .ok_or(SubscribeError::MissingPrecondition(Precondition::ChannelId))?;

        let request = HttpRequest::new(HttpMethod::Post, self.subscriptions_url())
            .bearer_token(credential.access_token())
            .header("Accept", "application/json")
            .json(&SubscriptionInsertRequest::for_channel(&channel_id))
            .map_err(|err| SubscribeError::TransportFault(fault_description(err)))?;

        info!("Sending subscription request");

        let response = match self.http_client.execute(request).await {
            Ok(response) => response,
            Err(err) => {
                let description = fault_description(err);
                warn!(error = %description, "Subscription request failed in transport");
                return Err(SubscribeError::TransportFault(description));
            }
        };

        if response.is_success() {
            let subscription_id = serde_json::from_slice::<SubscriptionResource>(&response.body)
                .ok()
                .and_then(|resource| resource.id);
            info!(
                status = response.status,
                subscription_id = ?subscription_id,
                "Subscribed to channel"
            );
            return Ok(());
        }

        let message = ApiErrorResponse::message_from(&response.body).unwrap_or_else(|| {
            debug!("Error response carried no readable message");
            DEFAULT_FAILURE_MESSAGE.to_string()
        });

        warn!(status = response.status, message = %message, "Subscription rejected by API");

        Err(SubscribeError::HttpFailure {
            status: response.status,
            message,
        })
    }
}

fn fault_description(err: BridgeError) -> String {
    match err {
        BridgeError::NotAvailable(msg) | BridgeError::OperationFailed(msg) => msg,
        BridgeError::Io(err) => err.to_string(),
    }
}
