use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::{DatabaseConnection, DbErr};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use service::bookmark::repo::seaorm::SeaOrmBookmarkRepository;
use service::bookmark::{BookmarkFormController, BookmarkRepository};
use service::capture::{HttpTabSource, TabCapture};
use service::identity::provider::GoogleUserInfoProvider;
use service::identity::repo::seaorm::SeaOrmUserDirectory;
use service::identity::IdentityResolver;
use service::registry::repo::seaorm::SeaOrmServiceRepository;
use service::registry::ServiceRegistry;
use service::saved_state::SavedStateIndicator;

use crate::errors::StartupError;
use crate::routes::{self, auth};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// A schema that failed to migrate is fatal.
fn migrations_applied(outcome: Result<(), DbErr>) -> Result<(), StartupError> {
    outcome.map_err(|e| {
        error!(error = %e, event = "migrate_failed", "migrations not applied; refusing to start");
        StartupError::Migration(e.to_string())
    })
}

/// Wires the SeaORM repositories and outbound clients into router state.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> Result<auth::ServerState, StartupError> {
    let provider = GoogleUserInfoProvider::new(&cfg.identity).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let tabs = HttpTabSource::new(&cfg.capture).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let bookmarks: Arc<dyn BookmarkRepository> = Arc::new(SeaOrmBookmarkRepository { db: db.clone() });
    // The per-URL cache belongs to the extension; the server answers from the database.
    let indicator = Arc::new(SavedStateIndicator::without_cache(bookmarks.clone()));
    let identity = IdentityResolver::new(Arc::new(SeaOrmUserDirectory { db: db.clone() }), Arc::new(provider));
    let registry = ServiceRegistry::new(Arc::new(SeaOrmServiceRepository { db }));

    Ok(auth::ServerState {
        auth: (&cfg.auth).into(),
        identity: Arc::new(identity),
        registry: Arc::new(registry),
        forms: Arc::new(BookmarkFormController::new(bookmarks.clone(), indicator.clone())),
        bookmarks,
        indicator,
        capture: Arc::new(TabCapture::new(Arc::new(tabs))),
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    let db = models::db::connect_with_config(&cfg.database).await?;
    migrations_applied(migration::Migrator::up(&db, None).await)?;

    let state = build_state(db, &cfg)?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg)?;
    info!(%addr, event = "listen", "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
