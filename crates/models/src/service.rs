use sea_orm::{entity::prelude::*, ConnectionTrait, PaginatorTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{bookmark, user};

/// A named, owner-scoped collection of bookmarks published at `/{path}`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub path: String,
    pub created_user_id: Uuid,
    pub user_email: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
    Bookmark,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::CreatedUserId)
                .to(user::Column::Id)
                .into(),
            Relation::Bookmark => Entity::has_many(bookmark::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Owner.def() }
}

impl Related<bookmark::Entity> for Entity {
    fn to() -> RelationDef { Relation::Bookmark.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_title(title: &str) -> Result<(), ModelError> {
    if title.trim().is_empty() {
        return Err(ModelError::Validation("service title required".into()));
    }
    Ok(())
}

/// A path is a single routing segment: non-empty, no slashes, no whitespace.
pub fn validate_path(path: &str) -> Result<(), ModelError> {
    let p = path.trim();
    if p.is_empty() {
        return Err(ModelError::Validation("service path required".into()));
    }
    if p.len() > 255 {
        return Err(ModelError::Validation("service path too long (<=255)".into()));
    }
    if p.contains('/') || p.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation("service path must be a single segment without '/' or spaces".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    owner_id: Uuid,
    owner_email: &str,
    title: &str,
    path: &str,
) -> Result<Model, ModelError> {
    validate_title(title)?;
    validate_path(path)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.trim().to_string()),
        path: Set(path.trim().to_string()),
        created_user_id: Set(owner_id),
        user_email: Set(owner_email.to_string()),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| match ModelError::from(e) {
        ModelError::Conflict(_) => ModelError::Conflict(format!("path already registered: {}", path.trim())),
        other => other,
    })
}

pub async fn count_for_owner<C: ConnectionTrait>(db: &C, owner_id: Uuid) -> Result<u64, ModelError> {
    Ok(Entity::find().filter(Column::CreatedUserId.eq(owner_id)).count(db).await?)
}

pub async fn find_by_path<C: ConnectionTrait>(db: &C, path: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Path.eq(path.trim())).one(db).await?)
}

pub async fn list_for_owner<C: ConnectionTrait>(db: &C, owner_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::CreatedUserId.eq(owner_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn list_for_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::UserEmail.eq(email.trim()))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_must_be_single_segment() {
        assert!(validate_path("buzz_memo").is_ok());
        assert!(validate_path("  tech-news ").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("a/b").is_err());
        assert!(validate_path("has space").is_err());
        assert!(validate_path(&"x".repeat(256)).is_err());
    }

    #[test]
    fn title_required() {
        assert!(validate_title("\t").is_err());
        assert!(validate_title("Buzz Memo").is_ok());
    }
}
