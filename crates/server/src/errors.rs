use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::bookmark::FormError;
use service::capture::CaptureError;
use service::errors::ServiceError;
use service::identity::IdentityError;
use service::registry::RegistryError;

/// JSON:API style error body: `{"errors":[{"status","title","detail"}]}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub title: String,
    pub detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorObject<'a> {
    status: String,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &str, detail: Option<String>) -> Self {
        Self { status, title: title.to_string(), detail }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some(detail.into()))
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(detail.into()))
    }

    fn internal(detail: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", Some(detail))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, detail = ?self.detail, "request failed");
        }
        let body = serde_json::json!({
            "errors": [ErrorObject {
                status: self.status.as_u16().to_string(),
                title: &self.title,
                detail: self.detail.as_deref(),
            }]
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<IdentityError> for JsonApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::AuthFailed(_) | IdentityError::TokenError(_) => Self::unauthorized(e.to_string()),
            IdentityError::NotRegistered(_) => Self::not_found(e.to_string()),
            IdentityError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(m)),
            IdentityError::Repository(_) => Self::internal(e.to_string()),
        }
    }
}

impl From<RegistryError> for JsonApiError {
    fn from(e: RegistryError) -> Self {
        let (status, title) = match &e {
            RegistryError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            RegistryError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "Already Registered"),
            RegistryError::QuotaExceeded { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "Quota Exceeded"),
            RegistryError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            RegistryError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            RegistryError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
        };
        Self::new(status, title, Some(e.to_string()))
    }
}

impl From<FormError> for JsonApiError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(m)),
            FormError::Persistence(m) => Self::new(StatusCode::BAD_GATEWAY, "Save Failed", Some(m)),
            FormError::NotFound(_) => Self::not_found(e.to_string()),
        }
    }
}

impl From<CaptureError> for JsonApiError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::RestrictedPage(_) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Restricted Page", Some(e.to_string())),
            CaptureError::NoActiveTab => Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(e.to_string())),
            CaptureError::Document(_) => Self::new(StatusCode::BAD_GATEWAY, "Capture Failed", Some(e.to_string())),
        }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(m)),
            ServiceError::NotFound(_) => Self::not_found(e.to_string()),
            _ => Self::internal(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database migration failed: {0}")]
    Migration(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
