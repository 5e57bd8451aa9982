use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, SessionUser};

#[derive(Deserialize)]
pub struct RegisterServiceInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub path: String,
}

pub async fn list(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<Vec<models::service::Model>>, JsonApiError> {
    Ok(Json(state.registry.list_for_owner(session.id).await?))
}

pub async fn register(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
    Json(input): Json<RegisterServiceInput>,
) -> Result<(StatusCode, Json<models::service::Model>), JsonApiError> {
    let owner = state.identity.current_user(session.id).await?;
    let created = state.registry.register(&owner, &input.title, &input.path).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
    Path(path): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    state.registry.delete_by_path(session.id, &path).await?;
    Ok(StatusCode::NO_CONTENT)
}
