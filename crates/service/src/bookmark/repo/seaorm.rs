use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use models::bookmark::{self, BookmarkFields, Model};

use crate::bookmark::repository::BookmarkRepository;
use crate::errors::ServiceError;

pub struct SeaOrmBookmarkRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl BookmarkRepository for SeaOrmBookmarkRepository {
    async fn insert(&self, fields: BookmarkFields) -> Result<Model, ServiceError> {
        Ok(bookmark::create(&self.db, fields).await?)
    }

    async fn update(&self, id: Uuid, fields: BookmarkFields) -> Result<Model, ServiceError> {
        Ok(bookmark::update(&self.db, id, fields).await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError> {
        bookmark::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn find_by_user_title(&self, user_id: Uuid, title: &str) -> Result<Option<Model>, ServiceError> {
        Ok(bookmark::find_by_user_title(&self.db, user_id, title).await?)
    }

    async fn list_by_service(&self, service_id: Uuid) -> Result<Vec<Model>, ServiceError> {
        Ok(bookmark::list_by_service(&self.db, service_id).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(bookmark::delete(&self.db, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, seed_user};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn list_is_newest_first() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let user = seed_user(&db).await;
        let path = format!("svc_{}", Uuid::new_v4().simple());
        let svc = models::service::create(&db, user.id, &user.email, "Repo Test", &path).await?;
        let repo = SeaOrmBookmarkRepository { db: db.clone() };

        let fields = |title: &str, days_ago: i64| BookmarkFields {
            title: title.into(),
            description: None,
            favicon_url: None,
            twitter_image_url: None,
            url: format!("https://example.com/{title}"),
            uploaded_date: (Utc::now() - Duration::days(days_ago)).into(),
            service_id: svc.id,
            last_updated_user_id: user.id,
            memo: None,
            is_visible: true,
        };
        repo.insert(fields("old", 3)).await?;
        repo.insert(fields("new", 0)).await?;
        let titles: Vec<String> = repo.list_by_service(svc.id).await?.into_iter().map(|m| m.title).collect();
        assert_eq!(titles, vec!["new".to_string(), "old".to_string()]);
        assert!(repo.find_by_user_title(user.id, "old").await?.is_some());

        models::user::hard_delete(&db, user.id).await?;
        Ok(())
    }
}
