use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use configs::IdentityConfig;

use super::domain::Profile;
use super::errors::IdentityError;

/// Exchanges an OAuth access token for the user's profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, IdentityError>;
}

/// Google's OAuth2 userinfo endpoint.
pub struct GoogleUserInfoProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl GoogleUserInfoProvider {
    pub fn new(cfg: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| IdentityError::AuthFailed(format!("http client: {e}")))?;
        Ok(Self { client, userinfo_url: cfg.userinfo_url.clone() })
    }
}

#[async_trait]
impl IdentityProvider for GoogleUserInfoProvider {
    async fn fetch_profile(&self, token: &str) -> Result<Profile, IdentityError> {
        let resp = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "userinfo request failed");
                IdentityError::AuthFailed(e.to_string())
            })?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%status, "userinfo rejected token");
            return Err(IdentityError::AuthFailed(format!("identity provider returned {status}")));
        }
        let profile: Profile = resp
            .json()
            .await
            .map_err(|e| IdentityError::AuthFailed(format!("malformed profile: {e}")))?;
        if profile.email.trim().is_empty() {
            return Err(IdentityError::AuthFailed("profile has no email".into()));
        }
        Ok(profile)
    }
}

/// Token-keyed in-memory provider for tests
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockIdentityProvider {
        profiles: Mutex<HashMap<String, Profile>>,
        delay: Option<Duration>,
    }

    impl MockIdentityProvider {
        pub fn with_token(self, token: &str, profile: Profile) -> Self {
            self.profiles.lock().unwrap().insert(token.to_string(), profile);
            self
        }

        /// Every lookup sleeps first; used to exercise message timeouts.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentityProvider {
        async fn fetch_profile(&self, token: &str) -> Result<Profile, IdentityError> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            let profiles = self.profiles.lock().unwrap();
            profiles
                .get(token)
                .cloned()
                .ok_or_else(|| IdentityError::AuthFailed("identity provider returned 401 Unauthorized".into()))
        }
    }
}
