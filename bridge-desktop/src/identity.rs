//! Loopback Identity Provider
//!
//! Runs the OAuth 2.0 implicit grant from a desktop process. The consent page
//! opens in the user's browser and redirects to a short-lived listener on
//! `127.0.0.1`. Because the token arrives in the URL fragment, which browsers
//! never send to a server, the listener first serves a tiny page that posts
//! the fragment back as a query string.
//!
//! Each connection is served on its own task, so an idle browser preconnect
//! cannot hold up the real redirect. A token client runs at most one flow;
//! a new request aborts the previous one and reuses its port.
//!
//! ```text
//! request_access_token()
//!   ├─ bind 127.0.0.1:<port>           falls back to a free port if taken
//!   ├─ launcher(auth_url)              user consents in the browser
//!   ├─ GET /#access_token=...     ──>  forwarding page
//!   ├─ GET /token?access_token=...&state=...
//!   └─ callback(TokenResponse)
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::identity::{
    IdentityProvider, TokenCallback, TokenClient, TokenClientConfig, TokenResponse,
};
use rand::Rng;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Google OAuth 2.0 authorization endpoint
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Hook that shows the consent URL to the user.
pub type UrlLauncher = Arc<dyn Fn(&str) + Send + Sync>;

const FORWARD_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Signing in</title></head>
<body>
<p id="status">Completing sign-in...</p>
<script>
  var params = window.location.hash.substring(1) || window.location.search.substring(1);
  fetch('/token?' + params).then(function () {
    document.getElementById('status').textContent = 'Done. You can close this window.';
  });
</script>
</body>
</html>
"#;

const DONE_PAGE: &str = "Sign-in complete. You can close this window.";

/// Time a single connection gets to deliver its request line and headers.
const CONNECTION_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the loopback redirect flow.
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Authorization endpoint
    pub auth_url: String,
    /// Port for the redirect listener; `0` picks a free port
    pub redirect_port: u16,
    /// How long to wait for the browser to come back
    pub consent_timeout: Duration,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            redirect_port: 8080,
            consent_timeout: Duration::from_secs(300),
        }
    }
}

/// Desktop `IdentityProvider` using a loopback redirect.
///
/// Requires a Tokio runtime at `init_token_client` time; the listener runs as
/// a task on that runtime.
pub struct LoopbackIdentityProvider {
    config: LoopbackConfig,
    launcher: UrlLauncher,
}

impl LoopbackIdentityProvider {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            launcher: Arc::new(default_launcher),
        }
    }

    /// Replace how the consent URL reaches the user.
    pub fn with_launcher(mut self, launcher: UrlLauncher) -> Self {
        self.launcher = launcher;
        self
    }
}

impl Default for LoopbackIdentityProvider {
    fn default() -> Self {
        Self::new(LoopbackConfig::default())
    }
}

fn default_launcher(url: &str) {
    info!("Waiting for consent in the browser");
    eprintln!("Open this URL in your browser to sign in with Google:\n\n  {}\n", url);
}

impl IdentityProvider for LoopbackIdentityProvider {
    fn is_available(&self) -> bool {
        Handle::try_current().is_ok()
    }

    fn init_token_client(
        &self,
        config: TokenClientConfig,
        callback: TokenCallback,
    ) -> Result<Box<dyn TokenClient>> {
        let runtime = Handle::try_current().map_err(|e| {
            BridgeError::NotAvailable(format!("Loopback identity provider needs a Tokio runtime: {}", e))
        })?;

        Url::parse(&self.config.auth_url).map_err(|e| {
            BridgeError::OperationFailed(format!("Invalid authorization URL: {}", e))
        })?;

        Ok(Box::new(LoopbackTokenClient {
            flow: Arc::new(FlowSettings {
                loopback: self.config.clone(),
                client: config,
            }),
            callback,
            launcher: Arc::clone(&self.launcher),
            runtime,
            active_flow: Mutex::new(None),
        }))
    }
}

struct FlowSettings {
    loopback: LoopbackConfig,
    client: TokenClientConfig,
}

struct LoopbackTokenClient {
    flow: Arc<FlowSettings>,
    callback: TokenCallback,
    launcher: UrlLauncher,
    runtime: Handle,
    active_flow: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for LoopbackTokenClient {
    fn drop(&mut self) {
        let active_flow = self
            .active_flow
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(flow) = active_flow.take() {
            flow.abort();
        }
    }
}

impl TokenClient for LoopbackTokenClient {
    fn request_access_token(&self) {
        if self.flow.client.client_id.trim().is_empty() {
            warn!("Token requested without a client ID");
            (self.callback)(TokenResponse::failed(
                "invalid_request",
                Some("Missing required parameter: client_id".to_string()),
            ));
            return;
        }

        let flow = Arc::clone(&self.flow);
        let callback = Arc::clone(&self.callback);
        let launcher = Arc::clone(&self.launcher);

        let mut active_flow = self
            .active_flow
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let previous = active_flow.take();
        if let Some(previous) = &previous {
            info!("Replacing unfinished sign-in flow");
            previous.abort();
        }

        *active_flow = Some(self.runtime.spawn(async move {
            if let Some(previous) = previous {
                // The aborted flow drops its listener before this resolves.
                let _ = previous.await;
            }
            let response = run_flow(&flow, launcher).await;
            callback(response);
        }));
    }
}

#[instrument(skip_all, fields(port = flow.loopback.redirect_port))]
async fn run_flow(flow: &FlowSettings, launcher: UrlLauncher) -> TokenResponse {
    let listener = match bind_redirect_listener(flow.loopback.redirect_port).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(error = %e, "Failed to bind redirect listener");
            return TokenResponse::failed(
                "server_error",
                Some(format!("Could not listen for the OAuth redirect: {}", e)),
            );
        }
    };

    let port = match listener.local_addr() {
        Ok(addr) => addr.port(),
        Err(e) => {
            return TokenResponse::failed("server_error", Some(e.to_string()));
        }
    };

    let redirect_uri = format!("http://127.0.0.1:{}/", port);
    let state = generate_state();

    let auth_url = match build_authorization_url(
        &flow.loopback.auth_url,
        &flow.client,
        &redirect_uri,
        &state,
    ) {
        Ok(url) => url,
        Err(e) => return TokenResponse::failed("invalid_request", Some(e.to_string())),
    };

    launcher(&auth_url);

    match tokio::time::timeout(
        flow.loopback.consent_timeout,
        accept_redirect(&listener, &state),
    )
    .await
    {
        Ok(response) => response,
        Err(_) => {
            warn!("Timed out waiting for the OAuth redirect");
            TokenResponse::failed(
                "timeout",
                Some("No response from the browser sign-in".to_string()),
            )
        }
    }
}

/// Bind the loopback listener, preferring `port` and falling back to a free one.
async fn bind_redirect_listener(port: u16) -> io::Result<TcpListener> {
    match TcpListener::bind((Ipv4Addr::LOCALHOST, port)).await {
        Ok(listener) => Ok(listener),
        Err(e) if port == 0 => Err(e),
        Err(e) => {
            warn!(port, error = %e, "Redirect port unavailable, using a dynamic port");
            TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await
        }
    }
}

/// Serve redirect requests until one carries the token response.
///
/// Connections still open when this returns are aborted with the set.
async fn accept_redirect(listener: &TcpListener, expected_state: &str) -> TokenResponse {
    let expected_state: Arc<str> = Arc::from(expected_state);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "Failed to accept redirect connection");
                        return TokenResponse::failed("server_error", Some(e.to_string()));
                    }
                };
                debug!(%peer, "Redirect connection accepted");

                let expected_state = Arc::clone(&expected_state);
                connections.spawn(async move {
                    tokio::time::timeout(
                        CONNECTION_READ_TIMEOUT,
                        handle_connection(stream, &expected_state),
                    )
                    .await
                    .unwrap_or_else(|_| {
                        Err(io::Error::new(io::ErrorKind::TimedOut, "no request received"))
                    })
                });
            }
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                match joined {
                    Ok(Ok(Some(response))) => return response,
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => debug!(error = %e, "Dropped redirect connection"),
                    Err(e) => warn!(error = %e, "Redirect connection task failed"),
                }
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    expected_state: &str,
) -> io::Result<Option<TokenResponse>> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain headers; the body is never needed.
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    let mut stream = reader.into_inner();
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");

    let Some(redirect) = parse_redirect_target(target) else {
        write_response(&mut stream, "400 Bad Request", "text/plain", "Bad request").await?;
        return Ok(None);
    };

    match redirect.path.as_str() {
        "/token" => {
            if redirect.state.as_deref() != Some(expected_state) {
                warn!("Redirect state mismatch; ignoring response");
                write_response(&mut stream, "400 Bad Request", "text/plain", "State mismatch")
                    .await?;
                return Ok(None);
            }
            write_response(&mut stream, "200 OK", "text/plain; charset=utf-8", DONE_PAGE).await?;
            Ok(Some(redirect.response))
        }
        "/" => {
            write_response(&mut stream, "200 OK", "text/html; charset=utf-8", FORWARD_PAGE)
                .await?;
            Ok(None)
        }
        _ => {
            write_response(&mut stream, "404 Not Found", "text/plain", "Not found").await?;
            Ok(None)
        }
    }
}

async fn write_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &str,
) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Random URL-safe `state` value for CSRF protection.
fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the implicit-grant authorization URL.
pub fn build_authorization_url(
    auth_url: &str,
    client: &TokenClientConfig,
    redirect_uri: &str,
    state: &str,
) -> Result<String> {
    let mut url = Url::parse(auth_url)
        .map_err(|e| BridgeError::OperationFailed(format!("Invalid authorization URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("client_id", &client.client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "token")
        .append_pair("scope", &client.scope)
        .append_pair("state", state)
        .append_pair("include_granted_scopes", "true");

    Ok(url.to_string())
}

/// A request received on the redirect listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    pub path: String,
    pub state: Option<String>,
    pub response: TokenResponse,
}

/// Parse a request target such as `/token?access_token=...&state=...`.
pub fn parse_redirect_target(target: &str) -> Option<RedirectRequest> {
    let url = Url::parse("http://127.0.0.1").ok()?.join(target).ok()?;

    let mut state = None;
    let mut response = TokenResponse::default();

    for (key, value) in url.query_pairs() {
        let value = value.into_owned();
        match key.as_ref() {
            "access_token" => response.access_token = Some(value),
            "token_type" => response.token_type = Some(value),
            "expires_in" => response.expires_in = value.parse().ok(),
            "scope" => response.scope = Some(value),
            "error" => response.error = Some(value),
            "error_description" => response.error_description = Some(value),
            "state" => state = Some(value),
            _ => {}
        }
    }

    Some(RedirectRequest {
        path: url.path().to_string(),
        state,
        response,
    })
}
