//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `IdentityProvider` running the implicit grant through the system
//!   browser and a loopback redirect listener
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{LoopbackIdentityProvider, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let identity = LoopbackIdentityProvider::default();
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod http;
mod identity;

pub use http::ReqwestHttpClient;
pub use identity::{
    build_authorization_url, parse_redirect_target, LoopbackConfig, LoopbackIdentityProvider,
    RedirectRequest, UrlLauncher, GOOGLE_AUTH_URL,
};
