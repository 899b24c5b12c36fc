//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, identity
//! provider) into the authorizer and the subscription requester, and owns the
//! interactive [`Session`]. Desktop apps typically enable the `desktop-shims`
//! feature (which depends on `bridge-desktop`) and call [`bootstrap_desktop`].
//!
//! Every operation outcome ends up as a status line in the session; nothing
//! here returns an error once the service is built.

pub mod error;
pub mod session;

pub use error::{CoreError, Result};
pub use session::{labels, status, Session};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, identity::IdentityProvider};
use core_auth::{AuthError, AuthState, Authorizer};
use core_runtime::config::AppConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, SubscriptionEvent};
use provider_youtube::{Precondition, SubscribeError, SubscriptionRequester};
use tracing::{info, instrument, warn};

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub event_bus: EventBus,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        identity_provider: Arc<dyn IdentityProvider>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            http_client,
            identity_provider,
            event_bus,
        }
    }
}

/// Primary façade exposed to host applications.
pub struct CoreService {
    config: AppConfig,
    event_bus: EventBus,
    authorizer: Authorizer,
    requester: SubscriptionRequester,
    session: Session,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    ///
    /// The session starts with the configured default channel, if any.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if `config` does not validate.
    pub fn new(deps: CoreDependencies, config: AppConfig) -> Result<Self> {
        config.validate()?;

        let authorizer = Authorizer::new(deps.identity_provider, deps.event_bus.clone());
        let requester =
            SubscriptionRequester::new(deps.http_client).with_base_url(&config.api_base_url);
        let session = Session::new(config.default_channel_id.clone().unwrap_or_default());

        Ok(Self {
            config,
            event_bus: deps.event_bus,
            authorizer,
            requester,
            session,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Update the channel ID field.
    pub fn set_channel_input(&mut self, channel_id: impl Into<String>) {
        self.session.channel_input = channel_id.into();
    }

    /// Authorization lifecycle state.
    pub fn auth_state(&self) -> AuthState {
        self.authorizer.state()
    }

    /// Stream of auth and subscription events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    pub fn can_subscribe(&self) -> bool {
        self.session.can_subscribe()
    }

    pub fn sign_in_label(&self) -> &'static str {
        self.session.sign_in_label()
    }

    pub fn subscribe_label(&self) -> &'static str {
        self.session.subscribe_label()
    }

    /// Run the consent flow and store the resulting credential.
    ///
    /// The token client is configured on first use. A failed attempt keeps
    /// any credential from an earlier sign-in.
    #[instrument(skip(self))]
    pub async fn sign_in(&mut self) {
        if !self.authorizer.is_configured() {
            if let Err(err) = self
                .authorizer
                .initialize(self.config.client_id_or_empty(), &self.config.scope)
            {
                self.session.set_message(auth_status(&err));
                return;
            }
        }

        match self.authorizer.request_token().await {
            Ok(credential) => {
                info!("Signed in");
                self.session.credential = Some(credential);
                self.session.set_message(status::SIGNED_IN);
            }
            Err(err) => {
                warn!(error = %err, "Sign-in failed");
                self.session.set_message(auth_status(&err));
            }
        }
    }

    /// Subscribe to the channel currently in the session.
    ///
    /// Missing sign-in or an empty channel field only update the status
    /// line. Otherwise the session is busy for the duration of the request.
    #[instrument(skip(self))]
    pub async fn subscribe(&mut self) {
        if !self.session.is_signed_in() {
            self.session.set_message(status::SIGN_IN_REQUIRED);
            return;
        }

        let channel_id = self.session.channel_input.trim().to_string();
        if channel_id.is_empty() {
            self.session.set_message(status::CHANNEL_REQUIRED);
            return;
        }

        self.session.busy = true;
        self.session.message = None;
        self.emit(SubscriptionEvent::Requested {
            channel_id: channel_id.clone(),
        });

        let result = self
            .requester
            .subscribe(self.session.credential.as_ref(), &channel_id)
            .await;

        self.session.busy = false;

        match result {
            Ok(()) => {
                self.session.set_message(status::SUBSCRIBED);
                self.emit(SubscriptionEvent::Succeeded { channel_id });
            }
            Err(err) => {
                let message = err.message();
                self.session.set_message(subscribe_status(&err));
                self.emit(SubscriptionEvent::Failed {
                    channel_id,
                    message,
                });
            }
        }
    }

    fn emit(&self, event: SubscriptionEvent) {
        let _ = self.event_bus.emit(CoreEvent::Subscription(event));
    }
}

fn auth_status(err: &AuthError) -> &'static str {
    match err {
        AuthError::ProviderUnavailable => status::PROVIDER_NOT_LOADED,
        AuthError::SignInInProgress => status::SIGN_IN_PENDING,
        AuthError::UserDeniedOrProviderError(_) | AuthError::NotConfigured => status::TOKEN_FAILED,
    }
}

fn subscribe_status(err: &SubscribeError) -> String {
    match err {
        SubscribeError::MissingPrecondition(Precondition::Credential) => {
            status::SIGN_IN_REQUIRED.to_string()
        }
        SubscribeError::MissingPrecondition(Precondition::ChannelId) => {
            status::CHANNEL_REQUIRED.to_string()
        }
        SubscribeError::HttpFailure { .. } | SubscribeError::TransportFault(_) => {
            status::subscribe_failed(&err.message())
        }
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses `reqwest` for HTTP and the loopback redirect flow for sign-in.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example() -> core_service::Result<()> {
/// use core_runtime::config::AppConfig;
///
/// let mut core = core_service::bootstrap_desktop(AppConfig::from_env()?)?;
/// core.sign_in().await;
/// core.subscribe().await;
/// println!("{}", core.session().message.as_deref().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: AppConfig) -> Result<CoreService> {
    use bridge_desktop::{LoopbackConfig, LoopbackIdentityProvider, ReqwestHttpClient};

    let http_client = ReqwestHttpClient::new()
        .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;
    let identity_provider = LoopbackIdentityProvider::new(LoopbackConfig {
        redirect_port: config.redirect_port,
        ..LoopbackConfig::default()
    });

    let deps = CoreDependencies::new(
        Arc::new(http_client),
        Arc::new(identity_provider),
        EventBus::default(),
    );

    CoreService::new(deps, config)
}
