use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Identity provider runtime is not available")]
    ProviderUnavailable,

    #[error("Authorization was denied or failed: {0}")]
    UserDeniedOrProviderError(String),

    #[error("Authorizer has not been initialized")]
    NotConfigured,

    #[error("A sign-in request is already awaiting the user")]
    SignInInProgress,
}

impl From<BridgeError> for AuthError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotAvailable(_) => AuthError::ProviderUnavailable,
            other => AuthError::UserDeniedOrProviderError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
