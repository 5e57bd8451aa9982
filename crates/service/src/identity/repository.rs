use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Profile};
use super::errors::IdentityError;

/// Persistence for registered users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, IdentityError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, IdentityError>;
    async fn create_user(&self, profile: &Profile) -> Result<AuthUser, IdentityError>;
    async fn refresh_profile(&self, id: Uuid, profile: &Profile) -> Result<AuthUser, IdentityError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockUserDirectory {
        users: Mutex<HashMap<String, AuthUser>>, // key: email
        unavailable: AtomicBool,
    }

    impl MockUserDirectory {
        pub fn with_user(self, email: &str, name: &str) -> Self {
            let user = AuthUser { id: Uuid::new_v4(), email: email.to_string(), name: name.to_string(), image: None };
            self.users.lock().unwrap().insert(email.to_string(), user);
            self
        }

        pub fn user(&self, email: &str) -> Option<AuthUser> {
            self.users.lock().unwrap().get(email).cloned()
        }

        /// Makes every call fail as if the backend were unreachable.
        pub fn set_unavailable(&self, down: bool) {
            self.unavailable.store(down, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), IdentityError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(IdentityError::Repository("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserDirectory for MockUserDirectory {
        async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, IdentityError> {
            self.check()?;
            Ok(self.users.lock().unwrap().get(email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, IdentityError> {
            self.check()?;
            Ok(self.users.lock().unwrap().values().find(|u| u.id == id).cloned())
        }

        async fn create_user(&self, profile: &Profile) -> Result<AuthUser, IdentityError> {
            self.check()?;
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&profile.email) {
                return Err(IdentityError::Repository(format!("duplicate email {}", profile.email)));
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: profile.email.clone(),
                name: profile.display_name().to_string(),
                image: profile.picture.clone(),
            };
            users.insert(profile.email.clone(), user.clone());
            Ok(user)
        }

        async fn refresh_profile(&self, id: Uuid, profile: &Profile) -> Result<AuthUser, IdentityError> {
            self.check()?;
            let mut users = self.users.lock().unwrap();
            let user = users
                .values_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| IdentityError::NotRegistered(id.to_string()))?;
            user.name = profile.display_name().to_string();
            user.image = profile.picture.clone();
            Ok(user.clone())
        }
    }
}
