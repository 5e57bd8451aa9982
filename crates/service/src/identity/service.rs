use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::domain::{AuthUser, Profile};
use super::errors::IdentityError;
use super::provider::IdentityProvider;
use super::repository::UserDirectory;

/// Resolves tokens to profiles and profiles to stored users.
pub struct IdentityResolver {
    directory: Arc<dyn UserDirectory>,
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityResolver {
    pub fn new(directory: Arc<dyn UserDirectory>, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { directory, provider }
    }

    /// Profile for `token`. A missing token, a rejected token or a transport failure
    /// all come back as [`IdentityError::AuthFailed`].
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Profile, IdentityError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| IdentityError::AuthFailed("missing auth token".into()))?;
        let profile = self.provider.fetch_profile(token).await.map_err(|e| match e {
            IdentityError::AuthFailed(m) => IdentityError::AuthFailed(m),
            other => IdentityError::AuthFailed(other.to_string()),
        })?;
        debug!(email = %profile.email, "profile fetched");
        Ok(profile)
    }

    /// Stored user id for `email`.
    ///
    /// # Examples
    /// ```
    /// use service::identity::{IdentityResolver, IdentityError};
    /// use service::identity::provider::mock::MockIdentityProvider;
    /// use service::identity::repository::mock::MockUserDirectory;
    /// use std::sync::Arc;
    /// let dir = Arc::new(MockUserDirectory::default().with_user("a@example.com", "A"));
    /// let resolver = IdentityResolver::new(dir, Arc::new(MockIdentityProvider::default()));
    /// assert!(tokio_test::block_on(resolver.resolve_user_id("a@example.com")).is_ok());
    /// let missing = tokio_test::block_on(resolver.resolve_user_id("b@example.com"));
    /// assert!(matches!(missing, Err(IdentityError::NotRegistered(_))));
    /// ```
    #[instrument(skip(self))]
    pub async fn resolve_user_id(&self, email: &str) -> Result<Uuid, IdentityError> {
        self.directory
            .find_by_email(email)
            .await?
            .map(|u| u.id)
            .ok_or_else(|| IdentityError::NotRegistered(email.to_string()))
    }

    /// Authenticates and registers the user on first sign-in; later sign-ins refresh
    /// the stored name and picture.
    #[instrument(skip(self, token))]
    pub async fn sign_in(&self, token: Option<&str>) -> Result<AuthUser, IdentityError> {
        let profile = self.authenticate(token).await?;
        match self.directory.find_by_email(&profile.email).await? {
            Some(existing) => {
                if existing.name == profile.display_name() && existing.image == profile.picture {
                    return Ok(existing);
                }
                let user = self.directory.refresh_profile(existing.id, &profile).await?;
                info!(user_id = %user.id, "profile_refreshed");
                Ok(user)
            }
            None => {
                let user = self.directory.create_user(&profile).await?;
                info!(user_id = %user.id, email = %user.email, "user_registered");
                Ok(user)
            }
        }
    }

    pub async fn current_user(&self, id: Uuid) -> Result<AuthUser, IdentityError> {
        self.directory
            .find_by_id(id)
            .await?
            .ok_or_else(|| IdentityError::NotRegistered(id.to_string()))
    }
}
