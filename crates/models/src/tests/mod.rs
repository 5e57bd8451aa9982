//! Database-backed CRUD tests. Skipped when `SKIP_DB_TESTS` is set or no
//! `DATABASE_URL` is available.

use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{bookmark, db, service, user};

async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: no database configured");
        return None;
    }
    let db = match db::connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }
    Some(db)
}

#[tokio::test]
async fn user_service_bookmark_workflow() -> anyhow::Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let email = format!("models_{}@example.com", Uuid::new_v4());
    let u = user::create(&db, &email, "Models User", None).await?;
    let found = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(found.id, u.id);

    let refreshed = user::refresh_profile(&db, u.id, "Renamed", Some("https://img.example.com/a.png")).await?;
    assert_eq!(refreshed.name, "Renamed");
    assert_eq!(refreshed.email, email);

    let path = format!("models_{}", Uuid::new_v4().simple());
    let s = service::create(&db, u.id, &email, "Models Service", &path).await?;
    assert_eq!(service::count_for_owner(&db, u.id).await?, 1);
    assert_eq!(service::find_by_path(&db, &path).await?.map(|m| m.id), Some(s.id));

    let dup = service::create(&db, u.id, &email, "Again", &path).await;
    assert!(matches!(dup, Err(ModelError::Conflict(_))));

    let fields = bookmark::BookmarkFields {
        title: "T".into(),
        description: Some("D".into()),
        favicon_url: Some("F".into()),
        twitter_image_url: Some("I".into()),
        url: "https://example.com/post".into(),
        uploaded_date: Utc::now().into(),
        service_id: s.id,
        last_updated_user_id: u.id,
        memo: None,
        is_visible: true,
    };
    let b = bookmark::create(&db, fields.clone()).await?;
    let by_title = bookmark::find_by_user_title(&db, u.id, "T").await?;
    assert_eq!(by_title.map(|m| m.id), Some(b.id));

    let updated = bookmark::update(&db, b.id, bookmark::BookmarkFields { memo: Some("note".into()), ..fields }).await?;
    assert_eq!(updated.memo.as_deref(), Some("note"));
    assert_eq!(bookmark::list_by_service(&db, s.id).await?.len(), 1);

    // services cascade to bookmarks
    service::Entity::delete_by_id(s.id).exec(&db).await?;
    assert!(bookmark::Entity::find_by_id(b.id).one(&db).await?.is_none());

    user::hard_delete(&db, u.id).await?;
    Ok(())
}

#[tokio::test]
async fn update_missing_bookmark_is_not_found() -> anyhow::Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };
    let res = bookmark::update(&db, Uuid::new_v4(), bookmark::BookmarkFields {
        title: "x".into(),
        description: None,
        favicon_url: None,
        twitter_image_url: None,
        url: "https://example.com".into(),
        uploaded_date: Utc::now().into(),
        service_id: Uuid::new_v4(),
        last_updated_user_id: Uuid::new_v4(),
        memo: None,
        is_visible: true,
    })
    .await;
    assert!(matches!(res, Err(ModelError::NotFound(_))));
    Ok(())
}
