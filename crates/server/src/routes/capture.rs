use axum::{extract::State, Json};
use serde::Deserialize;

use service::capture::{ActiveTab, PageMetadata};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Deserialize)]
pub struct CaptureInput {
    pub url: String,
}

/// Fetches `url` and returns the metadata a bookmark form would be prefilled with.
pub async fn capture(
    State(state): State<ServerState>,
    Json(input): Json<CaptureInput>,
) -> Result<Json<PageMetadata>, JsonApiError> {
    let tab = ActiveTab { id: 0, url: input.url.trim().to_string() };
    Ok(Json(state.capture.capture(&tab).await?))
}
