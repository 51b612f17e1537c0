use stowage_api::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no signing identity configured")]
    MissingIdentity,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
}

impl From<AuthError> for ClientError {
    fn from(err: AuthError) -> Self {
        Self::Authentication(err.to_string())
    }
}
