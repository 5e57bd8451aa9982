use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use uuid::Uuid;

use models::bookmark;

use crate::errors::JsonApiError;
use crate::routes::auth::{optional_session, ServerState};

#[derive(Serialize)]
pub struct ServiceSummary {
    pub id: Uuid,
    pub title: String,
    pub path: String,
}

/// Fields anyone may see.
#[derive(Serialize)]
pub struct PublicBookmark {
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub twitter_image_url: Option<String>,
    pub url: String,
    pub uploaded_date: DateTimeWithTimeZone,
}

impl From<bookmark::Model> for PublicBookmark {
    fn from(m: bookmark::Model) -> Self {
        Self {
            title: m.title,
            description: m.description,
            favicon_url: m.favicon_url,
            twitter_image_url: m.twitter_image_url,
            url: m.url,
            uploaded_date: m.uploaded_date,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum PageBookmarks {
    Public(Vec<PublicBookmark>),
    Editable(Vec<bookmark::Model>),
}

#[derive(Serialize)]
pub struct ServicePage {
    pub service: ServiceSummary,
    pub editable: bool,
    pub bookmarks: PageBookmarks,
}

/// Newest first. The owner gets every bookmark with memo and ids; everyone else
/// gets visible bookmarks with public fields.
pub async fn service_page(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Json<ServicePage>, JsonApiError> {
    let svc = state.registry.find_by_path(&path).await?;
    let rows = state.bookmarks.list_by_service(svc.id).await?;
    let editable = optional_session(&state, &headers).is_some_and(|s| s.id == svc.created_user_id);

    let bookmarks = if editable {
        PageBookmarks::Editable(rows)
    } else {
        PageBookmarks::Public(rows.into_iter().filter(|b| b.is_visible).map(PublicBookmark::from).collect())
    };
    Ok(Json(ServicePage {
        service: ServiceSummary { id: svc.id, title: svc.title, path: svc.path },
        editable,
        bookmarks,
    }))
}
