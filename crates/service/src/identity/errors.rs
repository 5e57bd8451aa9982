use thiserror::Error;

/// Business errors for sign-in and user resolution
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("not registered: {0}; sign in to register first")]
    NotRegistered(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl IdentityError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            IdentityError::AuthFailed(_) => 2001,
            IdentityError::NotRegistered(_) => 2002,
            IdentityError::Validation(_) => 2003,
            IdentityError::TokenError(_) => 2101,
            IdentityError::Repository(_) => 2200,
        }
    }
}

impl From<models::errors::ModelError> for IdentityError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(m) => IdentityError::Validation(m),
            other => IdentityError::Repository(other.to_string()),
        }
    }
}
