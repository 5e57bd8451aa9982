pub mod auth;
pub mod bookmarks;
pub mod capture;
pub mod identity;
pub mod pages;
pub mod services;

use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use self::auth::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public routes, session-protected API, service pages.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/logout", post(auth::logout))
        .route("/api/identity", get(identity::resolve))
        .route("/s/:path", get(pages::service_page));

    let protected = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/api/services", get(services::list).post(services::register))
        .route("/api/services/:path", delete(services::delete))
        .route("/api/capture", post(capture::capture))
        .route("/api/bookmarks", post(bookmarks::submit))
        .route("/api/bookmarks/saved", get(bookmarks::saved))
        .route("/api/bookmarks/:id", delete(bookmarks::delete))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    public
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
