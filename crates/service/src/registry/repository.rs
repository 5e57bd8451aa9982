use async_trait::async_trait;
use uuid::Uuid;

use models::service::Model;

use super::errors::RegistryError;

/// Services one user may own.
pub const MAX_SERVICES_PER_USER: u64 = 2;

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// Inserts the service unless `path` is taken or the owner already has `limit`
    /// services. Both checks and the insert happen atomically.
    async fn insert_within_quota(
        &self,
        owner_id: Uuid,
        owner_email: &str,
        title: &str,
        path: &str,
        limit: u64,
    ) -> Result<Model, RegistryError>;
    async fn find_by_path(&self, path: &str) -> Result<Option<Model>, RegistryError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, RegistryError>;
    async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Model>, RegistryError>;
    async fn list_for_email(&self, email: &str) -> Result<Vec<Model>, RegistryError>;
    async fn delete(&self, id: Uuid) -> Result<bool, RegistryError>;
}

/// Simple in-memory mock repository for tests
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockServiceRepository {
        rows: Mutex<Vec<Model>>,
    }

    #[async_trait]
    impl ServiceRepository for MockServiceRepository {
        async fn insert_within_quota(
            &self,
            owner_id: Uuid,
            owner_email: &str,
            title: &str,
            path: &str,
            limit: u64,
        ) -> Result<Model, RegistryError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|m| m.path == path) {
                return Err(RegistryError::AlreadyRegistered(path.to_string()));
            }
            if rows.iter().filter(|m| m.created_user_id == owner_id).count() as u64 >= limit {
                return Err(RegistryError::QuotaExceeded { limit });
            }
            let m = Model {
                id: Uuid::new_v4(),
                title: title.to_string(),
                path: path.to_string(),
                created_user_id: owner_id,
                user_email: owner_email.to_string(),
                created_at: Utc::now().into(),
            };
            rows.push(m.clone());
            Ok(m)
        }

        async fn find_by_path(&self, path: &str) -> Result<Option<Model>, RegistryError> {
            Ok(self.rows.lock().unwrap().iter().find(|m| m.path == path).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, RegistryError> {
            Ok(self.rows.lock().unwrap().iter().find(|m| m.id == id).cloned())
        }

        async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Model>, RegistryError> {
            Ok(self.rows.lock().unwrap().iter().filter(|m| m.created_user_id == owner_id).cloned().collect())
        }

        async fn list_for_email(&self, email: &str) -> Result<Vec<Model>, RegistryError> {
            Ok(self.rows.lock().unwrap().iter().filter(|m| m.user_email == email).cloned().collect())
        }

        async fn delete(&self, id: Uuid) -> Result<bool, RegistryError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|m| m.id != id);
            Ok(rows.len() != before)
        }
    }
}
