use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("path already registered: {0}")]
    AlreadyRegistered(String),
    #[error("service limit reached ({limit} per user)")]
    QuotaExceeded { limit: u64 },
    #[error("service not found: {0}")]
    NotFound(String),
    #[error("not the owner of service {0}")]
    Forbidden(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl RegistryError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            RegistryError::Validation(_) => 3001,
            RegistryError::AlreadyRegistered(_) => 3002,
            RegistryError::QuotaExceeded { .. } => 3003,
            RegistryError::NotFound(_) => 3004,
            RegistryError::Forbidden(_) => 3005,
            RegistryError::Repository(_) => 3200,
        }
    }
}

impl From<models::errors::ModelError> for RegistryError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(m) => RegistryError::Validation(m),
            ModelError::NotFound(m) => RegistryError::NotFound(m),
            other => RegistryError::Repository(other.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for RegistryError {
    fn from(e: sea_orm::DbErr) -> Self {
        RegistryError::Repository(e.to_string())
    }
}
