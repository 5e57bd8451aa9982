use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use service::bookmark::form::FormFields;
use service::bookmark::BookmarkForm;
use service::saved_state::SavedState;

use crate::errors::JsonApiError;
use crate::routes::auth::{ServerState, SessionUser};

fn visible_by_default() -> bool {
    true
}

/// The popup form as posted; `id` present means edit.
#[derive(Deserialize)]
pub struct SubmitInput {
    pub id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub favicon_url: String,
    #[serde(default)]
    pub twitter_image_url: String,
    #[serde(default)]
    pub publish_date: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub memo: String,
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

/// The bookmark `id`, provided the caller owns the service it lives in.
async fn owned_bookmark(state: &ServerState, user_id: Uuid, id: Uuid) -> Result<models::bookmark::Model, JsonApiError> {
    let existing = state
        .bookmarks
        .get(id)
        .await?
        .ok_or_else(|| JsonApiError::not_found(format!("bookmark {id}")))?;
    state.registry.owned_service(user_id, existing.service_id).await?;
    Ok(existing)
}

/// Inserts or updates; the target service and any existing row must belong to the caller.
pub async fn submit(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
    Json(input): Json<SubmitInput>,
) -> Result<(StatusCode, Json<models::bookmark::Model>), JsonApiError> {
    if let Some(id) = input.id {
        owned_bookmark(&state, session.id, id).await?;
    }
    if let Some(service_id) = input.service_id {
        state.registry.owned_service(session.id, service_id).await?;
    }
    let fields = FormFields {
        title: input.title,
        description: input.description,
        favicon_url: input.favicon_url,
        twitter_image_url: input.twitter_image_url,
        publish_date: input.publish_date,
        url: input.url,
        memo: input.memo,
        is_visible: input.is_visible,
    };
    let mut form = BookmarkForm::from_submission(input.id, input.service_id, fields);
    let saved = state.forms.submit(session.id, &mut form).await?;
    let status = if form.was_inserted() { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(saved)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    owned_bookmark(&state, session.id, id).await?;
    if !state.bookmarks.delete(id).await? {
        return Err(JsonApiError::not_found(format!("bookmark {id}")));
    }
    info!(bookmark_id = %id, user_id = %session.id, "bookmark_deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct SavedQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

pub async fn saved(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
    Query(q): Query<SavedQuery>,
) -> Json<SavedState> {
    Json(state.indicator.check(session.id, &q.title, &q.url).await)
}
