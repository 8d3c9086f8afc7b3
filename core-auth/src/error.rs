use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Stored credential is malformed")]
    MalformedCredential,

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::BridgeError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
