use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_) | ServiceError::Model(models::errors::ModelError::NotFound(_)))
    }

    /// The backend's message without the layer prefix, shown to users verbatim.
    pub fn raw_message(&self) -> String {
        use models::errors::ModelError;
        match self {
            ServiceError::Validation(m)
            | ServiceError::NotFound(m)
            | ServiceError::Db(m)
            | ServiceError::Storage(m) => m.clone(),
            ServiceError::Model(ModelError::Validation(m))
            | ServiceError::Model(ModelError::Conflict(m))
            | ServiceError::Model(ModelError::NotFound(m))
            | ServiceError::Model(ModelError::Db(m)) => m.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_message_strips_prefix() {
        let e = ServiceError::Model(models::errors::ModelError::Db("duplicate key".into()));
        assert_eq!(e.to_string(), "model error: database error: duplicate key");
        assert_eq!(e.raw_message(), "duplicate key");
        assert!(!e.is_not_found());
    }

    #[test]
    fn not_found_from_either_layer() {
        assert!(ServiceError::not_found("bookmark").is_not_found());
        assert!(ServiceError::Model(models::errors::ModelError::NotFound("bookmark x".into())).is_not_found());
    }
}
