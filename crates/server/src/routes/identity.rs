use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Deserialize)]
pub struct IdentityQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct IdentityOutput {
    pub user_id: Uuid,
}

pub async fn resolve(
    State(state): State<ServerState>,
    Query(q): Query<IdentityQuery>,
) -> Result<Json<IdentityOutput>, JsonApiError> {
    let user_id = state.identity.resolve_user_id(q.email.trim()).await?;
    Ok(Json(IdentityOutput { user_id }))
}
