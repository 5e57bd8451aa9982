use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use models::service::{self as service_model, Model};

use crate::identity::domain::AuthUser;

use super::errors::RegistryError;
use super::repository::{ServiceRepository, MAX_SERVICES_PER_USER};

pub struct ServiceRegistry {
    repo: Arc<dyn ServiceRepository>,
}

impl ServiceRegistry {
    pub fn new(repo: Arc<dyn ServiceRepository>) -> Self {
        Self { repo }
    }

    /// Registers a service for `owner`.
    ///
    /// A taken path is always [`RegistryError::AlreadyRegistered`], checked before the
    /// per-user limit.
    ///
    /// # Examples
    /// ```
    /// use service::registry::{ServiceRegistry, RegistryError};
    /// use service::registry::repository::mock::MockServiceRepository;
    /// use service::identity::domain::AuthUser;
    /// use std::sync::Arc;
    /// let reg = ServiceRegistry::new(Arc::new(MockServiceRepository::default()));
    /// let owner = AuthUser { id: uuid::Uuid::new_v4(), email: "o@example.com".into(), name: "O".into(), image: None };
    /// let svc = tokio_test::block_on(reg.register(&owner, "Tech news", "tech-news")).unwrap();
    /// assert_eq!(svc.path, "tech-news");
    /// let again = tokio_test::block_on(reg.register(&owner, "Other", "tech-news"));
    /// assert!(matches!(again, Err(RegistryError::AlreadyRegistered(_))));
    /// ```
    #[instrument(skip(self, owner), fields(owner_id = %owner.id))]
    pub async fn register(&self, owner: &AuthUser, title: &str, path: &str) -> Result<Model, RegistryError> {
        service_model::validate_title(title)?;
        service_model::validate_path(path)?;
        let created = self
            .repo
            .insert_within_quota(owner.id, &owner.email, title.trim(), path.trim(), MAX_SERVICES_PER_USER)
            .await?;
        info!(service_id = %created.id, path = %created.path, "service_registered");
        Ok(created)
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Model>, RegistryError> {
        self.repo.list_for_owner(owner_id).await
    }

    /// Services listed in the popup's selector.
    pub async fn list_for_email(&self, email: &str) -> Result<Vec<Model>, RegistryError> {
        self.repo.list_for_email(email).await
    }

    pub async fn find_by_path(&self, path: &str) -> Result<Model, RegistryError> {
        self.repo
            .find_by_path(path.trim())
            .await?
            .ok_or_else(|| RegistryError::NotFound(path.trim().to_string()))
    }

    /// The service `service_id`, provided `user_id` owns it.
    pub async fn owned_service(&self, user_id: Uuid, service_id: Uuid) -> Result<Model, RegistryError> {
        let svc = self
            .repo
            .find_by_id(service_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("service {service_id}")))?;
        if svc.created_user_id != user_id {
            return Err(RegistryError::Forbidden(svc.path));
        }
        Ok(svc)
    }

    /// Deletes the service at `path` along with its bookmarks. Only the owner may.
    #[instrument(skip(self))]
    pub async fn delete_by_path(&self, owner_id: Uuid, path: &str) -> Result<(), RegistryError> {
        let svc = self.find_by_path(path).await?;
        if svc.created_user_id != owner_id {
            return Err(RegistryError::Forbidden(svc.path));
        }
        if !self.repo.delete(svc.id).await? {
            return Err(RegistryError::NotFound(svc.path));
        }
        info!(service_id = %svc.id, "service_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::repository::mock::MockServiceRepository;

    fn owner(email: &str) -> AuthUser {
        AuthUser { id: Uuid::new_v4(), email: email.into(), name: "Owner".into(), image: None }
    }

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(Arc::new(MockServiceRepository::default()))
    }

    #[tokio::test]
    async fn third_service_exceeds_quota() {
        let reg = registry();
        let o = owner("o@example.com");
        reg.register(&o, "One", "one").await.unwrap();
        reg.register(&o, "Two", "two").await.unwrap();
        let err = reg.register(&o, "Three", "three").await.unwrap_err();
        assert!(matches!(err, RegistryError::QuotaExceeded { limit: 2 }));
        assert_eq!(reg.list_for_owner(o.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn taken_path_wins_over_quota() {
        let reg = registry();
        let a = owner("a@example.com");
        reg.register(&a, "One", "one").await.unwrap();
        reg.register(&a, "Two", "two").await.unwrap();
        let err = reg.register(&a, "Again", "one").await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(p) if p == "one"));
        let b = owner("b@example.com");
        assert!(matches!(reg.register(&b, "Mine", " two ").await, Err(RegistryError::AlreadyRegistered(_))));
    }

    #[tokio::test]
    async fn invalid_input_rejected() {
        let reg = registry();
        let o = owner("o@example.com");
        assert!(matches!(reg.register(&o, "", "p").await, Err(RegistryError::Validation(_))));
        assert!(matches!(reg.register(&o, "T", "").await, Err(RegistryError::Validation(_))));
        assert!(matches!(reg.register(&o, "T", "a/b").await, Err(RegistryError::Validation(_))));
    }

    #[tokio::test]
    async fn only_owner_deletes() {
        let reg = registry();
        let o = owner("o@example.com");
        reg.register(&o, "One", "one").await.unwrap();
        let err = reg.delete_by_path(Uuid::new_v4(), "one").await.unwrap_err();
        assert_eq!(err.code(), 3005);
        reg.delete_by_path(o.id, "one").await.unwrap();
        assert!(matches!(reg.find_by_path("one").await, Err(RegistryError::NotFound(_))));
        assert!(matches!(reg.delete_by_path(o.id, "one").await, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn owned_service_checks_owner() {
        let reg = registry();
        let o = owner("o@example.com");
        let svc = reg.register(&o, "One", "one").await.unwrap();
        assert_eq!(reg.owned_service(o.id, svc.id).await.unwrap().id, svc.id);
        assert!(matches!(reg.owned_service(Uuid::new_v4(), svc.id).await, Err(RegistryError::Forbidden(p)) if p == "one"));
        assert!(matches!(reg.owned_service(o.id, Uuid::new_v4()).await, Err(RegistryError::NotFound(_))));
    }

    #[tokio::test]
    async fn lists_by_email() {
        let reg = registry();
        let o = owner("o@example.com");
        reg.register(&o, "One", "one").await.unwrap();
        assert_eq!(reg.list_for_email("o@example.com").await.unwrap().len(), 1);
        assert!(reg.list_for_email("x@example.com").await.unwrap().is_empty());
    }
}
