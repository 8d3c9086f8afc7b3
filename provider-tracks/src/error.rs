use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Resolution endpoint returned status {status}: {message}")]
    Endpoint { status: u16, message: String },

    #[error("Failed to parse resolution response: {0}")]
    Parse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<ResolverError> for BridgeError {
    fn from(err: ResolverError) -> Self {
        match err {
            ResolverError::Endpoint { status, message } => {
                BridgeError::Endpoint { status, message }
            }
            ResolverError::Parse(msg) => BridgeError::OperationFailed(msg),
            ResolverError::Network(msg) => BridgeError::OperationFailed(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolverError>;
