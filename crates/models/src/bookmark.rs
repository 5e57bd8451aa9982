use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::{service, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookmarks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub twitter_image_url: Option<String>,
    pub url: String,
    pub uploaded_date: DateTimeWithTimeZone,
    pub service_id: Uuid,
    pub last_updated_user_id: Uuid,
    pub memo: Option<String>,
    pub is_visible: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Service,
    LastUpdatedUser,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Service => Entity::belongs_to(service::Entity)
                .from(Column::ServiceId)
                .to(service::Column::Id)
                .into(),
            Relation::LastUpdatedUser => Entity::belongs_to(user::Entity)
                .from(Column::LastUpdatedUserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<service::Entity> for Entity {
    fn to() -> RelationDef { Relation::Service.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Column values written by both insert and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookmarkFields {
    pub title: String,
    pub description: Option<String>,
    pub favicon_url: Option<String>,
    pub twitter_image_url: Option<String>,
    pub url: String,
    pub uploaded_date: DateTimeWithTimeZone,
    pub service_id: Uuid,
    pub last_updated_user_id: Uuid,
    pub memo: Option<String>,
    pub is_visible: bool,
}

pub fn validate_fields(f: &BookmarkFields) -> Result<(), ModelError> {
    if f.title.trim().is_empty() { return Err(ModelError::Validation("title required".into())); }
    if f.url.trim().is_empty() { return Err(ModelError::Validation("url required".into())); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, fields: BookmarkFields) -> Result<Model, ModelError> {
    validate_fields(&fields)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(fields.title),
        description: Set(fields.description),
        favicon_url: Set(fields.favicon_url),
        twitter_image_url: Set(fields.twitter_image_url),
        url: Set(fields.url),
        uploaded_date: Set(fields.uploaded_date),
        service_id: Set(fields.service_id),
        last_updated_user_id: Set(fields.last_updated_user_id),
        memo: Set(fields.memo),
        is_visible: Set(fields.is_visible),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn update<C: ConnectionTrait>(db: &C, id: Uuid, fields: BookmarkFields) -> Result<Model, ModelError> {
    validate_fields(&fields)?;
    let mut am: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ModelError::NotFound(format!("bookmark {id}")))?
        .into();
    am.title = Set(fields.title);
    am.description = Set(fields.description);
    am.favicon_url = Set(fields.favicon_url);
    am.twitter_image_url = Set(fields.twitter_image_url);
    am.url = Set(fields.url);
    am.uploaded_date = Set(fields.uploaded_date);
    am.service_id = Set(fields.service_id);
    am.last_updated_user_id = Set(fields.last_updated_user_id);
    am.memo = Set(fields.memo);
    am.is_visible = Set(fields.is_visible);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn find_by_user_title<C: ConnectionTrait>(db: &C, user_id: Uuid, title: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::LastUpdatedUserId.eq(user_id))
        .filter(Column::Title.eq(title))
        .one(db)
        .await?)
}

/// Newest `uploaded_date` first, the order the service page shows.
pub async fn list_by_service<C: ConnectionTrait>(db: &C, service_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::ServiceId.eq(service_id))
        .order_by_desc(Column::UploadedDate)
        .all(db)
        .await?)
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
