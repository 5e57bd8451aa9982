#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};

static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn db_config() -> DatabaseConfig {
    let mut cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    cfg.normalize_from_env();
    cfg.min_connections = cfg.min_connections.min(1);
    cfg.acquire_timeout_secs = 10;
    cfg
}

/// A migrated connection, or `None` when database tests are disabled or unreachable.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: no database configured");
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match connect_with_config(&db_config()).await {
                Ok(db) => migration::Migrator::up(&db, None).await.is_ok(),
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {e}");
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }
    connect_with_config(&db_config()).await.ok()
}

/// Inserts a throwaway user row for repository tests.
pub async fn seed_user(db: &DatabaseConnection) -> models::user::Model {
    let email = format!("svc_{}@example.com", uuid::Uuid::new_v4());
    models::user::create(db, &email, "Service Test", None).await.expect("seed user")
}
