use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),

    #[error("Authorization error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Subscription error: {0}")]
    Subscribe(#[from] provider_youtube::SubscribeError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
