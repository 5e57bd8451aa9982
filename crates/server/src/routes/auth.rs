use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use service::bookmark::{BookmarkFormController, BookmarkRepository};
use service::capture::TabCapture;
use service::identity::session::{issue_session, verify_session};
use service::identity::IdentityResolver;
use service::registry::ServiceRegistry;
use service::saved_state::SavedStateIndicator;

use crate::errors::JsonApiError;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub session_hours: i64,
    pub cookie_name: String,
}

impl From<&configs::AuthConfig> for ServerAuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self { jwt_secret: c.jwt_secret.clone(), session_hours: c.session_hours, cookie_name: c.cookie_name.clone() }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: ServerAuthConfig,
    pub identity: Arc<IdentityResolver>,
    pub registry: Arc<ServiceRegistry>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    pub indicator: Arc<SavedStateIndicator>,
    pub forms: Arc<BookmarkFormController>,
    pub capture: Arc<TabCapture>,
}

/// Signed-in user, placed in request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
pub struct SignInInput {
    /// OAuth access token issued to the browser by the identity provider.
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Serialize)]
pub struct SignInOutput {
    #[serde(flatten)]
    pub user: MeOutput,
    pub token: String,
}

pub async fn signin(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<SignInInput>,
) -> Result<(CookieJar, Json<SignInOutput>), JsonApiError> {
    let user = state.identity.sign_in(input.token.as_deref()).await?;
    let token = issue_session(&user, &state.auth.jwt_secret, state.auth.session_hours)?;

    let mut cookie = Cookie::new(state.auth.cookie_name.clone(), token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    info!(user_id = %user.id, event = "signin", "session issued");

    let me = MeOutput { user_id: user.id, email: user.email, name: user.name, image: user.image };
    Ok((jar, Json(SignInOutput { user: me, token })))
}

pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(state.auth.cookie_name.clone());
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionUser>,
) -> Result<Json<MeOutput>, JsonApiError> {
    let user = state.identity.current_user(session.id).await?;
    Ok(Json(MeOutput { user_id: user.id, email: user.email, name: user.name, image: user.image }))
}

/// Session token from `Authorization: Bearer`, falling back to the session cookie.
fn session_token(headers: &HeaderMap, cookie_name: &str) -> Result<Option<String>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(t.trim().to_string())),
            _ => Err(JsonApiError::unauthorized("invalid Authorization format (expect Bearer)")),
        };
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar.get(cookie_name).map(|c| c.value().to_string()).filter(|t| !t.is_empty()))
}

/// The caller's session, if a valid one is present.
pub fn optional_session(state: &ServerState, headers: &HeaderMap) -> Option<SessionUser> {
    let token = session_token(headers, &state.auth.cookie_name).ok().flatten()?;
    let claims = verify_session(&token, &state.auth.jwt_secret).ok()?;
    let id = claims.user_id().ok()?;
    Some(SessionUser { id, email: claims.email })
}

/// Rejects requests without a valid session with 401.
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    let token = session_token(req.headers(), &state.auth.cookie_name)?.ok_or_else(|| {
        warn!(path = %path, "missing Authorization header and session cookie");
        JsonApiError::unauthorized("sign in required")
    })?;
    let claims = verify_session(&token, &state.auth.jwt_secret).map_err(|e| {
        warn!(path = %path, err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired session")
    })?;
    let id = claims.user_id()?;
    req.extensions_mut().insert(SessionUser { id, email: claims.email });
    Ok(next.run(req).await)
}
