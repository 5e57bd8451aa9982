use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::identity::domain::{AuthUser, Profile};
use crate::identity::errors::IdentityError;
use crate::identity::repository::UserDirectory;

pub struct SeaOrmUserDirectory {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl UserDirectory for SeaOrmUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, IdentityError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(AuthUser::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, IdentityError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| IdentityError::Repository(e.to_string()))?;
        Ok(res.map(AuthUser::from))
    }

    async fn create_user(&self, profile: &Profile) -> Result<AuthUser, IdentityError> {
        let created = models::user::create(&self.db, &profile.email, profile.display_name(), profile.picture.as_deref()).await?;
        Ok(created.into())
    }

    async fn refresh_profile(&self, id: Uuid, profile: &Profile) -> Result<AuthUser, IdentityError> {
        let updated = models::user::refresh_profile(&self.db, id, profile.display_name(), profile.picture.as_deref()).await?;
        Ok(updated.into())
    }
}
