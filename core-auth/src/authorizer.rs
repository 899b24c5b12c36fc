//! # Authorizer
//!
//! Drives the identity provider's token-client flow and exposes its outcome
//! as a single-resolution [`TokenRequest`] future.
//!
//! ## Overview
//!
//! The provider reports results through a callback registered when the token
//! client is configured. The authorizer owns that callback: each call to
//! [`Authorizer::request_token`] parks a oneshot sender, and the callback
//! resolves it exactly once with either a [`Credential`] or an [`AuthError`].
//!
//! ```text
//! initialize(client_id, scope)      request_token()          callback(response)
//!   Unconfigured -> Ready      ->   * -> AwaitingUser   ->   Authorized | Unauthorized
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use core_auth::Authorizer;
//! use core_runtime::events::EventBus;
//! use std::sync::Arc;
//! # use bridge_traits::identity::IdentityProvider;
//!
//! # async fn run(provider: Arc<dyn IdentityProvider>) -> core_auth::Result<()> {
//! let authorizer = Authorizer::new(provider, EventBus::default());
//! authorizer.initialize("1234.apps.googleusercontent.com", "https://www.googleapis.com/auth/youtube")?;
//!
//! let credential = authorizer.request_token().await?;
//! assert!(authorizer.state().is_authorized());
//! # let _ = credential;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::{AuthState, Credential};
use bridge_traits::identity::{
    IdentityProvider, TokenCallback, TokenClient, TokenClientConfig, TokenResponse,
};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

/// Provider name carried in auth events.
const PROVIDER_NAME: &str = "google_identity";

type Outcome = Result<Credential>;

/// Mutable lifecycle state shared with the provider callback.
struct Shared {
    state: AuthState,
    scope: Option<String>,
    client: Option<Arc<dyn TokenClient>>,
    /// Bumped on every `initialize` so callbacks from a replaced client are ignored.
    generation: u64,
    pending: Option<oneshot::Sender<Outcome>>,
}

impl Shared {
    fn has_live_request(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }
}

/// OAuth 2.0 implicit-grant authorizer.
///
/// Cheap to share behind `Arc`; all methods take `&self`.
pub struct Authorizer {
    identity_provider: Arc<dyn IdentityProvider>,
    event_bus: EventBus,
    shared: Arc<Mutex<Shared>>,
}

impl Authorizer {
    pub fn new(identity_provider: Arc<dyn IdentityProvider>, event_bus: EventBus) -> Self {
        Self {
            identity_provider,
            event_bus,
            shared: Arc::new(Mutex::new(Shared {
                state: AuthState::Unconfigured,
                scope: None,
                client: None,
                generation: 0,
                pending: None,
            })),
        }
    }

    /// Configure a token client bound to `client_id` and `scope`.
    ///
    /// Re-initializing replaces the previous client. A request still pending
    /// on the old client resolves with `UserDeniedOrProviderError`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProviderUnavailable` if the provider runtime is not
    /// loaded. The current state is left unchanged in that case.
    #[instrument(skip(self))]
    pub fn initialize(&self, client_id: &str, scope: &str) -> Result<()> {
        if !self.identity_provider.is_available() {
            warn!("Identity provider runtime unavailable; token client not configured");
            self.emit_error(&AuthError::ProviderUnavailable);
            return Err(AuthError::ProviderUnavailable);
        }

        if client_id.trim().is_empty() {
            warn!("No OAuth client ID configured; the provider will reject authorization");
        }

        let generation = lock(&self.shared).generation + 1;
        let callback = self.token_callback(generation, scope.to_string());
        let config = TokenClientConfig::new(client_id, scope);

        let client = self
            .identity_provider
            .init_token_client(config, callback)
            .map_err(|err| {
                warn!(error = %err, "Failed to configure token client");
                let err = AuthError::from(err);
                self.emit_error(&err);
                err
            })?;

        let mut shared = lock(&self.shared);
        if shared.pending.take().is_some() {
            debug!("Dropped pending token request of the replaced client");
        }
        shared.generation = generation;
        shared.client = Some(Arc::from(client));
        shared.scope = Some(scope.to_string());
        shared.state = AuthState::Ready;

        info!("Token client configured");
        Ok(())
    }

    /// Start the interactive consent flow.
    ///
    /// Returns immediately. The returned handle resolves once the provider
    /// calls back. When a precondition fails the handle is already resolved
    /// and the state is unchanged:
    ///
    /// - `NotConfigured` before [`Authorizer::initialize`] succeeded
    /// - `ProviderUnavailable` if the provider runtime has gone away
    /// - `SignInInProgress` while another request awaits the user
    pub fn request_token(&self) -> TokenRequest {
        let mut shared = lock(&self.shared);

        let Some(client) = shared.client.clone() else {
            debug!("Token requested before the authorizer was initialized");
            return TokenRequest::resolved(Err(AuthError::NotConfigured));
        };

        if !self.identity_provider.is_available() {
            warn!("Identity provider runtime unavailable; token request rejected");
            drop(shared);
            self.emit_error(&AuthError::ProviderUnavailable);
            return TokenRequest::resolved(Err(AuthError::ProviderUnavailable));
        }

        if shared.has_live_request() {
            debug!("Token requested while another request awaits the user");
            return TokenRequest::resolved(Err(AuthError::SignInInProgress));
        }

        let (sender, receiver) = oneshot::channel();
        shared.pending = Some(sender);
        shared.state = AuthState::AwaitingUser;
        drop(shared);

        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::SigningIn {
            provider: PROVIDER_NAME.to_string(),
        }));

        info!("Starting interactive consent flow");
        // The provider may call back synchronously; no lock is held here.
        client.request_access_token();

        TokenRequest::pending(receiver)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AuthState {
        lock(&self.shared).state
    }

    /// Scope the token client was configured with.
    pub fn scope(&self) -> Option<String> {
        lock(&self.shared).scope.clone()
    }

    /// Returns `true` once a token client is configured.
    pub fn is_configured(&self) -> bool {
        lock(&self.shared).client.is_some()
    }

    fn token_callback(&self, generation: u64, scope: String) -> TokenCallback {
        let shared = Arc::clone(&self.shared);
        let event_bus = self.event_bus.clone();

        Arc::new(move |response: TokenResponse| {
            complete_request(&shared, &event_bus, generation, &scope, response);
        })
    }

    fn emit_error(&self, err: &AuthError) {
        let _ = self.event_bus.emit(CoreEvent::Auth(AuthEvent::AuthError {
            message: err.to_string(),
            recoverable: true,
        }));
    }
}

fn complete_request(
    shared: &Mutex<Shared>,
    event_bus: &EventBus,
    generation: u64,
    scope: &str,
    response: TokenResponse,
) {
    let mut guard = lock(shared);

    if guard.generation != generation {
        debug!("Ignoring callback from a replaced token client");
        return;
    }

    let Some(sender) = guard.pending.take() else {
        warn!("Token callback received with no pending request; ignoring");
        return;
    };

    let (outcome, event) = match response.access_token() {
        Some(token) => {
            guard.state = AuthState::Authorized;
            info!(expires_in = ?response.expires_in, "Access token issued");
            (
                Ok(Credential::new(token, scope)),
                AuthEvent::SignedIn {
                    provider: PROVIDER_NAME.to_string(),
                    scope: scope.to_string(),
                },
            )
        }
        None => {
            guard.state = AuthState::Unauthorized;
            let reason = response.failure_reason();
            warn!(reason = %reason, "Token request denied or failed");
            (
                Err(AuthError::UserDeniedOrProviderError(reason.clone())),
                AuthEvent::AuthError {
                    message: reason,
                    recoverable: true,
                },
            )
        }
    };
    drop(guard);

    let _ = event_bus.emit(CoreEvent::Auth(event));

    if sender.send(outcome).is_err() {
        debug!("Token request handle was dropped before resolution");
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to one token request.
///
/// Resolves exactly once to the issued [`Credential`] or the reason none was
/// issued. If the token client goes away without calling back, it resolves
/// to `UserDeniedOrProviderError`.
#[must_use = "the token request resolves through this handle"]
pub struct TokenRequest {
    inner: TokenRequestInner,
}

enum TokenRequestInner {
    Resolved(Option<Outcome>),
    Pending(oneshot::Receiver<Outcome>),
}

impl TokenRequest {
    fn resolved(outcome: Outcome) -> Self {
        Self {
            inner: TokenRequestInner::Resolved(Some(outcome)),
        }
    }

    fn pending(receiver: oneshot::Receiver<Outcome>) -> Self {
        Self {
            inner: TokenRequestInner::Pending(receiver),
        }
    }
}

impl Future for TokenRequest {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            TokenRequestInner::Resolved(outcome) => Poll::Ready(outcome.take().unwrap_or_else(
                || {
                    Err(AuthError::UserDeniedOrProviderError(
                        "token request already resolved".to_string(),
                    ))
                },
            )),
            TokenRequestInner::Pending(receiver) => Pin::new(receiver).poll(cx).map(|result| {
                result.unwrap_or_else(|_| {
                    Err(AuthError::UserDeniedOrProviderError(
                        "identity provider dropped the request without a response".to_string(),
                    ))
                })
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::{timeout, Duration};

    const SCOPE: &str = "https://www.googleapis.com/auth/youtube";

    /// Identity provider double that records configuration and lets tests
    /// answer requests either immediately or later through `respond`.
    #[derive(Default)]
    struct FakeIdentityProvider {
        unavailable: AtomicBool,
        auto_response: Mutex<Option<TokenResponse>>,
        configs: Mutex<Vec<TokenClientConfig>>,
        callbacks: Mutex<Vec<TokenCallback>>,
        requests: Arc<AtomicUsize>,
    }

    impl FakeIdentityProvider {
        fn answering(response: TokenResponse) -> Arc<Self> {
            let provider = Self::default();
            *provider.auto_response.lock().unwrap() = Some(response);
            Arc::new(provider)
        }

        fn set_available(&self, available: bool) {
            self.unavailable.store(!available, Ordering::SeqCst);
        }

        fn respond(&self, response: TokenResponse) {
            let callback = self.callbacks.lock().unwrap().last().cloned().unwrap();
            callback(response);
        }

        fn respond_with_client(&self, index: usize, response: TokenResponse) {
            let callback = self.callbacks.lock().unwrap()[index].clone();
            callback(response);
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    struct FakeTokenClient {
        callback: TokenCallback,
        auto_response: Option<TokenResponse>,
        requests: Arc<AtomicUsize>,
    }

    impl TokenClient for FakeTokenClient {
        fn request_access_token(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if let Some(response) = self.auto_response.clone() {
                (self.callback)(response);
            }
        }
    }

    impl IdentityProvider for FakeIdentityProvider {
        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn init_token_client(
            &self,
            config: TokenClientConfig,
            callback: TokenCallback,
        ) -> BridgeResult<Box<dyn TokenClient>> {
            if !self.is_available() {
                return Err(BridgeError::NotAvailable("identity runtime".to_string()));
            }
            self.configs.lock().unwrap().push(config);
            self.callbacks.lock().unwrap().push(callback.clone());
            Ok(Box::new(FakeTokenClient {
                callback,
                auto_response: self.auto_response.lock().unwrap().clone(),
                requests: Arc::clone(&self.requests),
            }))
        }
    }

    fn authorizer_with(provider: Arc<FakeIdentityProvider>) -> (Authorizer, EventBus) {
        let event_bus = EventBus::new(16);
        let authorizer = Authorizer::new(provider, event_bus.clone());
        (authorizer, event_bus)
    }

    #[test]
    fn test_initialize_configures_token_client() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());

        assert_eq!(authorizer.state(), AuthState::Unconfigured);
        authorizer.initialize("client-123", SCOPE).unwrap();

        assert_eq!(authorizer.state(), AuthState::Ready);
        assert!(authorizer.is_configured());
        assert_eq!(authorizer.scope().as_deref(), Some(SCOPE));

        let configs = provider.configs.lock().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0], TokenClientConfig::new("client-123", SCOPE));
    }

    #[tokio::test]
    async fn test_initialize_without_provider_runtime() {
        let provider = Arc::new(FakeIdentityProvider::default());
        provider.set_available(false);
        let (authorizer, bus) = authorizer_with(provider.clone());
        let mut events = bus.subscribe();

        let result = authorizer.initialize("client-123", SCOPE);

        assert_eq!(result, Err(AuthError::ProviderUnavailable));
        assert_eq!(authorizer.state(), AuthState::Unconfigured);
        assert!(!authorizer.is_configured());
        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::AuthError { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_before_initialize() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());

        let result = authorizer.request_token().await;

        assert_eq!(result, Err(AuthError::NotConfigured));
        assert_eq!(authorizer.state(), AuthState::Unconfigured);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_successful_authorization() {
        let provider = FakeIdentityProvider::answering(TokenResponse::granted("tok123"));
        let (authorizer, bus) = authorizer_with(provider.clone());
        let mut events = bus.subscribe();
        authorizer.initialize("client-123", SCOPE).unwrap();

        let credential = authorizer.request_token().await.unwrap();

        assert_eq!(credential.access_token(), "tok123");
        assert_eq!(credential.scope(), SCOPE);
        assert_eq!(authorizer.state(), AuthState::Authorized);
        assert_eq!(provider.request_count(), 1);

        assert!(matches!(
            events.recv().await.unwrap(),
            CoreEvent::Auth(AuthEvent::SigningIn { .. })
        ));
        match events.recv().await.unwrap() {
            CoreEvent::Auth(AuthEvent::SignedIn { scope, .. }) => assert_eq!(scope, SCOPE),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_denied_authorization() {
        let provider = FakeIdentityProvider::answering(TokenResponse::failed(
            "access_denied",
            Some("The user denied access".to_string()),
        ));
        let (authorizer, _bus) = authorizer_with(provider);
        authorizer.initialize("client-123", SCOPE).unwrap();

        let result = authorizer.request_token().await;

        assert_eq!(
            result,
            Err(AuthError::UserDeniedOrProviderError(
                "access_denied: The user denied access".to_string()
            ))
        );
        assert_eq!(authorizer.state(), AuthState::Unauthorized);
    }

    #[tokio::test]
    async fn test_empty_access_token_is_a_failure() {
        let provider = FakeIdentityProvider::answering(TokenResponse {
            access_token: Some(String::new()),
            ..TokenResponse::default()
        });
        let (authorizer, _bus) = authorizer_with(provider);
        authorizer.initialize("client-123", SCOPE).unwrap();

        let result = authorizer.request_token().await;

        assert!(matches!(
            result,
            Err(AuthError::UserDeniedOrProviderError(_))
        ));
        assert_eq!(authorizer.state(), AuthState::Unauthorized);
    }

    #[tokio::test]
    async fn test_request_awaits_user_until_callback() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();

        let request = authorizer.request_token();
        assert_eq!(authorizer.state(), AuthState::AwaitingUser);

        let second = authorizer.request_token().await;
        assert_eq!(second, Err(AuthError::SignInInProgress));
        assert_eq!(authorizer.state(), AuthState::AwaitingUser);
        assert_eq!(provider.request_count(), 1);

        provider.respond(TokenResponse::granted("tok123"));

        let credential = timeout(Duration::from_secs(1), request)
            .await
            .expect("request should resolve")
            .unwrap();
        assert_eq!(credential.access_token(), "tok123");
        assert_eq!(authorizer.state(), AuthState::Authorized);
    }

    #[tokio::test]
    async fn test_callback_without_pending_request_is_ignored() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();

        provider.respond(TokenResponse::granted("unsolicited"));

        assert_eq!(authorizer.state(), AuthState::Ready);
    }

    #[tokio::test]
    async fn test_reauthorization_overwrites_outcome() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();

        let first = authorizer.request_token();
        provider.respond(TokenResponse::granted("tok-1"));
        assert_eq!(first.await.unwrap().access_token(), "tok-1");

        let second = authorizer.request_token();
        assert_eq!(authorizer.state(), AuthState::AwaitingUser);
        provider.respond(TokenResponse::failed("popup_closed", None));
        assert!(second.await.is_err());
        assert_eq!(authorizer.state(), AuthState::Unauthorized);

        let third = authorizer.request_token();
        provider.respond(TokenResponse::granted("tok-3"));
        assert_eq!(third.await.unwrap().access_token(), "tok-3");
        assert_eq!(authorizer.state(), AuthState::Authorized);
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_dropped_handle_allows_new_request() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();

        drop(authorizer.request_token());

        let request = authorizer.request_token();
        provider.respond(TokenResponse::granted("tok123"));
        assert!(request.await.is_ok());
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_reinitialize_resolves_pending_request() {
        let provider = Arc::new(FakeIdentityProvider::default());
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();

        let request = authorizer.request_token();
        authorizer.initialize("client-456", SCOPE).unwrap();

        assert!(matches!(
            request.await,
            Err(AuthError::UserDeniedOrProviderError(_))
        ));
        assert_eq!(authorizer.state(), AuthState::Ready);

        // A late answer from the replaced client does not leak into new requests.
        let fresh = authorizer.request_token();
        provider.respond_with_client(0, TokenResponse::granted("stale"));
        assert_eq!(authorizer.state(), AuthState::AwaitingUser);

        provider.respond_with_client(1, TokenResponse::granted("fresh"));
        assert_eq!(fresh.await.unwrap().access_token(), "fresh");
    }

    #[tokio::test]
    async fn test_provider_lost_after_initialize() {
        let provider = FakeIdentityProvider::answering(TokenResponse::granted("tok123"));
        let (authorizer, _bus) = authorizer_with(provider.clone());
        authorizer.initialize("client-123", SCOPE).unwrap();
        authorizer.request_token().await.unwrap();

        provider.set_available(false);
        let result = authorizer.request_token().await;

        assert_eq!(result, Err(AuthError::ProviderUnavailable));
        assert_eq!(authorizer.state(), AuthState::Authorized);
        assert_eq!(provider.request_count(), 1);
    }
}
