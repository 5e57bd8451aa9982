use sea_orm::{DatabaseConnection, EntityTrait, QuerySelect, TransactionTrait};
use tracing::debug;
use uuid::Uuid;

use models::errors::ModelError;
use models::service::{self, Model};
use models::user;

use crate::registry::errors::RegistryError;
use crate::registry::repository::ServiceRepository;

pub struct SeaOrmServiceRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl ServiceRepository for SeaOrmServiceRepository {
    async fn insert_within_quota(
        &self,
        owner_id: Uuid,
        owner_email: &str,
        title: &str,
        path: &str,
        limit: u64,
    ) -> Result<Model, RegistryError> {
        let txn = self.db.begin().await?;

        // Row lock on the owner serializes concurrent registrations by the same user.
        user::Entity::find_by_id(owner_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| RegistryError::Validation(format!("unknown owner {owner_id}")))?;

        if service::find_by_path(&txn, path).await?.is_some() {
            return Err(RegistryError::AlreadyRegistered(path.trim().to_string()));
        }
        let owned = service::count_for_owner(&txn, owner_id).await?;
        if owned >= limit {
            debug!(%owner_id, owned, limit, "service quota reached");
            return Err(RegistryError::QuotaExceeded { limit });
        }
        // The unique index still guards a path raced in by another owner.
        let created = service::create(&txn, owner_id, owner_email, title, path)
            .await
            .map_err(|e| match e {
                ModelError::Conflict(_) => RegistryError::AlreadyRegistered(path.trim().to_string()),
                other => other.into(),
            })?;
        txn.commit().await?;
        Ok(created)
    }

    async fn find_by_path(&self, path: &str) -> Result<Option<Model>, RegistryError> {
        Ok(service::find_by_path(&self.db, path).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, RegistryError> {
        Ok(service::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Model>, RegistryError> {
        Ok(service::list_for_owner(&self.db, owner_id).await?)
    }

    async fn list_for_email(&self, email: &str) -> Result<Vec<Model>, RegistryError> {
        Ok(service::list_for_email(&self.db, email).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RegistryError> {
        let res = service::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
