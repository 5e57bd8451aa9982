use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::domain::Profile;

/// Messages the popup sends to the background worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtensionRequest {
    #[serde(rename = "getUserProfile")]
    GetUserProfile,
}

/// Exactly one of these answers each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionResponse {
    Profile { profile: Profile },
    Error { error: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("background worker is gone")]
    Disconnected,
}
