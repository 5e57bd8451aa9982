use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use models::bookmark::Model;

use crate::bookmark::{BookmarkForm, BookmarkFormController, FormError};
use crate::capture::{ActiveTab, CaptureError, PageMetadata, TabCapture};
use crate::identity::{IdentityError, IdentityResolver};
use crate::registry::ServiceRegistry;
use crate::saved_state::{Icon, SavedState, SavedStateIndicator};

use super::background::BackgroundHandle;

#[derive(Debug, Error)]
pub enum PopupError {
    /// Show the sign-in prompt.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    /// Show the registration prompt.
    #[error("not registered: {0}")]
    NotRegistered(String),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<IdentityError> for PopupError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::AuthFailed(m) => PopupError::AuthFailed(m),
            IdentityError::NotRegistered(email) => PopupError::NotRegistered(email),
            other => PopupError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOption {
    pub id: Uuid,
    pub title: String,
}

/// Everything one open popup works with.
#[derive(Debug, Clone)]
pub struct PopupSession {
    pub user_id: Uuid,
    pub email: String,
    pub services: Vec<ServiceOption>,
    pub tab: ActiveTab,
    pub metadata: PageMetadata,
    pub form: BookmarkForm,
    pub saved: SavedState,
    pub icon: Icon,
}

pub struct Popup {
    background: BackgroundHandle,
    identity: Arc<IdentityResolver>,
    registry: Arc<ServiceRegistry>,
    capture: TabCapture,
    indicator: Arc<SavedStateIndicator>,
    controller: BookmarkFormController,
}

impl Popup {
    pub fn new(
        background: BackgroundHandle,
        identity: Arc<IdentityResolver>,
        registry: Arc<ServiceRegistry>,
        capture: TabCapture,
        indicator: Arc<SavedStateIndicator>,
        controller: BookmarkFormController,
    ) -> Self {
        Self { background, identity, registry, capture, indicator, controller }
    }

    /// Profile, user id, services, capture, saved-state check; in that order.
    /// A page already saved by this user is loaded for editing rather than prefilled.
    #[instrument(skip(self))]
    pub async fn open(&self) -> Result<PopupSession, PopupError> {
        let profile = self.background.user_profile().await?;
        let user_id = self.identity.resolve_user_id(&profile.email).await?;
        let services: Vec<ServiceOption> = self
            .registry
            .list_for_email(&profile.email)
            .await
            .map_err(|e| PopupError::Backend(e.to_string()))?
            .into_iter()
            .map(|s| ServiceOption { id: s.id, title: s.title })
            .collect();

        let (tab, metadata) = self.capture.capture_active().await?;
        let (saved, existing) = self.indicator.lookup(user_id, &metadata.title, &tab.url).await;
        // An already saved page reopens as an edit of the stored bookmark.
        let form = match &existing {
            Some(bookmark) => BookmarkForm::for_existing(bookmark),
            None => {
                let mut form = BookmarkForm::new();
                form.populate(&metadata, services.first().map(|s| s.id));
                form
            }
        };
        let icon = saved.icon();
        info!(%user_id, services = services.len(), ?saved, "popup opened");

        Ok(PopupSession { user_id, email: profile.email, services, tab, metadata, form, saved, icon })
    }

    pub async fn save(&self, session: &mut PopupSession) -> Result<Model, FormError> {
        let saved = self.controller.submit(session.user_id, &mut session.form).await?;
        session.saved = SavedState::Found;
        session.icon = Icon::Saved;
        Ok(saved)
    }
}

/// Icon for a tab that just changed. Only finished http(s) loads are looked up.
pub async fn on_tab_updated(indicator: &SavedStateIndicator, complete: bool, url: Option<&str>) -> Icon {
    match url {
        Some(url) if complete && crate::capture::tab::is_capturable(url) => indicator.icon_for(url).await,
        _ => Icon::Default,
    }
}
