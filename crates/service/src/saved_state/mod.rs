//! Has this page already been bookmarked, and which toolbar icon follows from that.

pub mod cache;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use models::bookmark::Model;

use crate::bookmark::BookmarkRepository;
use crate::errors::ServiceError;

use cache::SavedStateCache;

/// Outcome of a saved-state check. A failed lookup is its own outcome, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SavedState {
    Found,
    NotFound,
    CheckFailed { reason: String },
}

impl SavedState {
    pub fn icon(&self) -> Icon {
        match self {
            SavedState::Found => Icon::Saved,
            SavedState::NotFound | SavedState::CheckFailed { .. } => Icon::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Default,
    Saved,
}

impl Icon {
    pub fn is_saved(self) -> bool {
        matches!(self, Icon::Saved)
    }

    /// Toolbar image bundled with the extension.
    pub fn asset(self) -> &'static str {
        match self {
            Icon::Default => "icon-default.png",
            Icon::Saved => "icon-saved.png",
        }
    }
}

/// Answers "is this page saved" from the backend. With a cache attached (the
/// extension side) hits are also remembered per URL for the toolbar icon.
pub struct SavedStateIndicator {
    repo: Arc<dyn BookmarkRepository>,
    cache: Option<Arc<SavedStateCache>>,
}

impl SavedStateIndicator {
    pub fn new(repo: Arc<dyn BookmarkRepository>, cache: Arc<SavedStateCache>) -> Self {
        Self { repo, cache: Some(cache) }
    }

    /// Backend lookups only; nothing is remembered between requests.
    pub fn without_cache(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self { repo, cache: None }
    }

    /// Looks the page up by (user, title); a hit is remembered under `url`.
    pub async fn check(&self, user_id: Uuid, title: &str, url: &str) -> SavedState {
        self.lookup(user_id, title, url).await.0
    }

    /// Like [`check`](Self::check), also returning the matching bookmark.
    pub async fn lookup(&self, user_id: Uuid, title: &str, url: &str) -> (SavedState, Option<Model>) {
        match self.repo.find_by_user_title(user_id, title).await {
            Ok(Some(found)) => {
                if let Err(e) = self.mark_saved(url).await {
                    warn!(error = %e, "saved-page cache not updated");
                }
                (SavedState::Found, Some(found))
            }
            Ok(None) => (SavedState::NotFound, None),
            Err(e) => {
                warn!(error = %e, %url, "saved-state check failed");
                (SavedState::CheckFailed { reason: e.raw_message() }, None)
            }
        }
    }

    pub async fn mark_saved(&self, url: &str) -> Result<(), ServiceError> {
        match &self.cache {
            Some(cache) => cache.mark_saved(url).await,
            None => Ok(()),
        }
    }

    pub async fn forget(&self, url: &str) -> Result<bool, ServiceError> {
        match &self.cache {
            Some(cache) => cache.forget(url).await,
            None => Ok(false),
        }
    }

    pub async fn icon_for(&self, url: &str) -> Icon {
        let saved = match &self.cache {
            Some(cache) => cache.is_saved(url).await,
            None => false,
        };
        let icon = if saved { Icon::Saved } else { Icon::Default };
        debug!(%url, ?icon, "icon resolved");
        icon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::repository::mock::MockBookmarkRepository;
    use chrono::Utc;
    use models::bookmark::BookmarkFields;

    async fn seeded(user: Uuid) -> Arc<MockBookmarkRepository> {
        let repo = Arc::new(MockBookmarkRepository::default());
        repo.insert(BookmarkFields {
            title: "Saved post".into(),
            description: None,
            favicon_url: None,
            twitter_image_url: None,
            url: "https://example.com/saved".into(),
            uploaded_date: Utc::now().into(),
            service_id: Uuid::new_v4(),
            last_updated_user_id: user,
            memo: None,
            is_visible: true,
        })
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn found_sets_saved_icon() {
        let user = Uuid::new_v4();
        let ind = SavedStateIndicator::new(seeded(user).await, SavedStateCache::in_memory());
        assert_eq!(ind.icon_for("https://example.com/saved").await, Icon::Default);
        let state = ind.check(user, "Saved post", "https://example.com/saved").await;
        assert_eq!(state, SavedState::Found);
        assert_eq!(state.icon(), Icon::Saved);
        assert_eq!(ind.icon_for("https://example.com/saved").await, Icon::Saved);
    }

    #[tokio::test]
    async fn lookup_returns_the_saved_row() {
        let user = Uuid::new_v4();
        let ind = SavedStateIndicator::new(seeded(user).await, SavedStateCache::in_memory());
        let (state, found) = ind.lookup(user, "Saved post", "https://example.com/saved").await;
        assert_eq!(state, SavedState::Found);
        assert_eq!(found.map(|m| m.url), Some("https://example.com/saved".to_string()));
    }

    #[tokio::test]
    async fn uncached_indicator_remembers_nothing() {
        let user = Uuid::new_v4();
        let ind = SavedStateIndicator::without_cache(seeded(user).await);
        assert_eq!(ind.check(user, "Saved post", "https://example.com/saved").await, SavedState::Found);
        ind.mark_saved("https://example.com/saved").await.unwrap();
        assert_eq!(ind.icon_for("https://example.com/saved").await, Icon::Default);
        assert!(!ind.forget("https://example.com/saved").await.unwrap());
    }

    #[tokio::test]
    async fn other_users_titles_do_not_match() {
        let ind = SavedStateIndicator::new(seeded(Uuid::new_v4()).await, SavedStateCache::in_memory());
        assert_eq!(ind.check(Uuid::new_v4(), "Saved post", "https://example.com/saved").await, SavedState::NotFound);
    }

    #[tokio::test]
    async fn lookup_failure_is_distinct_and_unsaved() {
        let repo = seeded(Uuid::new_v4()).await;
        repo.fail_with(Some("timeout"));
        let ind = SavedStateIndicator::new(repo, SavedStateCache::in_memory());
        let state = ind.check(Uuid::new_v4(), "Saved post", "https://example.com/saved").await;
        assert_eq!(state, SavedState::CheckFailed { reason: "timeout".into() });
        assert_eq!(state.icon(), Icon::Default);
    }

    #[test]
    fn wire_shape() {
        assert_eq!(serde_json::to_value(SavedState::NotFound).unwrap(), serde_json::json!({"state": "not_found"}));
        let failed = SavedState::CheckFailed { reason: "x".into() };
        assert_eq!(serde_json::to_value(failed).unwrap(), serde_json::json!({"state": "check_failed", "reason": "x"}));
    }
}
