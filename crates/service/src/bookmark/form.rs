use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use models::bookmark::{BookmarkFields, Model};

use crate::capture::PageMetadata;
use crate::saved_state::SavedStateIndicator;

use super::repository::BookmarkRepository;

/// Lifecycle of one bookmark form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormState {
    Unpopulated,
    Populated,
    Edited,
    Submitted,
    Saved,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    /// Rejected before any backend call.
    #[error("{0}")]
    Validation(String),
    /// The backend's own message, unmodified.
    #[error("{0}")]
    Persistence(String),
    /// The bookmark being edited no longer exists.
    #[error("Bookmark {0} was not found.")]
    NotFound(Uuid),
}

/// Editable values, kept as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormFields {
    pub title: String,
    pub description: String,
    pub favicon_url: String,
    pub twitter_image_url: String,
    pub publish_date: String,
    pub url: String,
    pub memo: String,
    pub is_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Title(String),
    Description(String),
    FaviconUrl(String),
    TwitterImageUrl(String),
    PublishDate(String),
    Memo(String),
    Visible(bool),
    Service(Option<Uuid>),
}

#[derive(Debug, Clone)]
pub struct BookmarkForm {
    state: FormState,
    fields: FormFields,
    service_id: Option<Uuid>,
    bookmark_id: Option<Uuid>,
    captured_publish_date: Option<String>,
    inserted: bool,
}

impl Default for BookmarkForm {
    fn default() -> Self {
        Self::new()
    }
}

impl BookmarkForm {
    pub fn new() -> Self {
        Self {
            state: FormState::Unpopulated,
            fields: FormFields { is_visible: true, ..Default::default() },
            service_id: None,
            bookmark_id: None,
            captured_publish_date: None,
            inserted: false,
        }
    }

    /// Form for editing a stored bookmark; submitting it updates that row.
    pub fn for_existing(m: &Model) -> Self {
        Self {
            state: FormState::Populated,
            fields: FormFields {
                title: m.title.clone(),
                description: m.description.clone().unwrap_or_default(),
                favicon_url: m.favicon_url.clone().unwrap_or_default(),
                twitter_image_url: m.twitter_image_url.clone().unwrap_or_default(),
                publish_date: m.uploaded_date.to_rfc3339(),
                url: m.url.clone(),
                memo: m.memo.clone().unwrap_or_default(),
                is_visible: m.is_visible,
            },
            service_id: Some(m.service_id),
            bookmark_id: Some(m.id),
            captured_publish_date: Some(m.uploaded_date.to_rfc3339()),
            inserted: false,
        }
    }

    /// Form rebuilt from values submitted over HTTP; `bookmark_id` selects update.
    pub fn from_submission(bookmark_id: Option<Uuid>, service_id: Option<Uuid>, fields: FormFields) -> Self {
        Self { state: FormState::Edited, fields, service_id, bookmark_id, captured_publish_date: None, inserted: false }
    }

    /// Prefills every field from a capture and preselects `default_service`.
    pub fn populate(&mut self, meta: &PageMetadata, default_service: Option<Uuid>) {
        self.fields = FormFields {
            title: meta.title.clone(),
            description: meta.description.clone().unwrap_or_default(),
            favicon_url: meta.favicon_url.clone().unwrap_or_default(),
            twitter_image_url: meta.twitter_image_url.clone().unwrap_or_default(),
            publish_date: meta.publish_date.clone(),
            url: meta.url.clone(),
            memo: String::new(),
            is_visible: true,
        };
        self.captured_publish_date = Some(meta.publish_date.clone());
        self.service_id = default_service;
        self.state = FormState::Populated;
    }

    pub fn edit(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Title(v) => self.fields.title = v,
            FieldEdit::Description(v) => self.fields.description = v,
            FieldEdit::FaviconUrl(v) => self.fields.favicon_url = v,
            FieldEdit::TwitterImageUrl(v) => self.fields.twitter_image_url = v,
            FieldEdit::PublishDate(v) => self.fields.publish_date = v,
            FieldEdit::Memo(v) => self.fields.memo = v,
            FieldEdit::Visible(v) => self.fields.is_visible = v,
            FieldEdit::Service(id) => self.service_id = id,
        }
        self.state = FormState::Edited;
    }

    pub fn state(&self) -> FormState { self.state }
    pub fn fields(&self) -> &FormFields { &self.fields }
    pub fn service_id(&self) -> Option<Uuid> { self.service_id }
    pub fn bookmark_id(&self) -> Option<Uuid> { self.bookmark_id }
    /// Whether the last successful submit created a new row.
    pub fn was_inserted(&self) -> bool { self.inserted }

    /// Column values to persist, or the first validation problem.
    pub fn validate(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<BookmarkFields, FormError> {
        let service_id = self
            .service_id
            .ok_or_else(|| FormError::Validation("Please select a service.".into()))?;
        let title = self.fields.title.trim();
        if title.is_empty() {
            return Err(FormError::Validation("Title is required.".into()));
        }
        let url = self.fields.url.trim();
        if url.is_empty() {
            return Err(FormError::Validation("URL is required.".into()));
        }
        let date = if self.fields.publish_date.trim().is_empty() {
            self.captured_publish_date.as_deref().unwrap_or("")
        } else {
            self.fields.publish_date.as_str()
        };
        Ok(BookmarkFields {
            title: title.to_string(),
            description: non_empty(&self.fields.description),
            favicon_url: non_empty(&self.fields.favicon_url),
            twitter_image_url: non_empty(&self.fields.twitter_image_url),
            url: url.to_string(),
            uploaded_date: parse_publish_date(date, now)?,
            service_id,
            last_updated_user_id: user_id,
            memo: non_empty(&self.fields.memo),
            is_visible: self.fields.is_visible,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or `YYYY-MM-DD`; blank means `fallback`.
pub fn parse_publish_date(input: &str, fallback: DateTime<Utc>) -> Result<DateTime<FixedOffset>, FormError> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(fallback.fixed_offset());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc().fixed_offset());
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)) {
        return Ok(naive.and_utc().fixed_offset());
    }
    Err(FormError::Validation(format!("Invalid publish date: {s}")))
}

/// Submits forms: validate locally, then exactly one insert or update.
pub struct BookmarkFormController {
    repo: Arc<dyn BookmarkRepository>,
    indicator: Arc<SavedStateIndicator>,
}

impl BookmarkFormController {
    pub fn new(repo: Arc<dyn BookmarkRepository>, indicator: Arc<SavedStateIndicator>) -> Self {
        Self { repo, indicator }
    }

    /// Validates, then writes once. A form without an id first looks up the user's
    /// bookmark with the same title; a hit is updated instead of inserted again.
    #[instrument(skip(self, form), fields(bookmark_id = ?form.bookmark_id))]
    pub async fn submit(&self, user_id: Uuid, form: &mut BookmarkForm) -> Result<Model, FormError> {
        let fields = form.validate(user_id, Utc::now())?;
        form.state = FormState::Submitted;

        let target = match form.bookmark_id {
            Some(id) => Ok(Some(id)),
            None => self
                .repo
                .find_by_user_title(user_id, &fields.title)
                .await
                .map(|existing| existing.map(|m| m.id)),
        };
        let inserting = matches!(target, Ok(None));
        let result = match target {
            Ok(Some(id)) => self.repo.update(id, fields).await.map_err(|e| (Some(id), e)),
            Ok(None) => self.repo.insert(fields).await.map_err(|e| (None, e)),
            Err(e) => Err((None, e)),
        };
        match result {
            Ok(saved) => {
                form.bookmark_id = Some(saved.id);
                form.inserted = inserting;
                form.state = FormState::Saved;
                if let Err(e) = self.indicator.mark_saved(&saved.url).await {
                    warn!(error = %e, "saved-page cache not updated");
                }
                info!(bookmark_id = %saved.id, service_id = %saved.service_id, "bookmark_saved");
                Ok(saved)
            }
            Err((Some(id), e)) if e.is_not_found() => {
                form.state = FormState::Edited;
                warn!(%id, "bookmark to update is gone");
                Err(FormError::NotFound(id))
            }
            Err((_, e)) => {
                form.state = FormState::Edited;
                warn!(error = %e, "bookmark save failed");
                Err(FormError::Persistence(e.raw_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::repository::mock::{MockBookmarkRepository, RepoCall};
    use crate::saved_state::cache::SavedStateCache;
    use chrono::TimeZone;

    fn meta() -> PageMetadata {
        PageMetadata {
            url: "https://example.com/post".into(),
            title: "Post".into(),
            description: Some("About things".into()),
            favicon_url: None,
            twitter_image_url: Some("https://example.com/card.png".into()),
            publish_date: "2024-02-03T10:20:30+09:00".into(),
        }
    }

    fn controller() -> (Arc<MockBookmarkRepository>, Arc<SavedStateIndicator>, BookmarkFormController) {
        let repo = Arc::new(MockBookmarkRepository::default());
        let indicator = Arc::new(SavedStateIndicator::new(repo.clone(), SavedStateCache::in_memory()));
        let ctl = BookmarkFormController::new(repo.clone(), indicator.clone());
        (repo, indicator, ctl)
    }

    #[test]
    fn populate_then_edit_moves_state() {
        let mut form = BookmarkForm::new();
        assert_eq!(form.state(), FormState::Unpopulated);
        form.populate(&meta(), Some(Uuid::new_v4()));
        assert_eq!(form.state(), FormState::Populated);
        assert_eq!(form.fields().description, "About things");
        form.edit(FieldEdit::Memo("read later".into()));
        assert_eq!(form.state(), FormState::Edited);
    }

    #[test]
    fn publish_date_formats() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let rfc = parse_publish_date("2024-02-03T10:20:30+09:00", now).unwrap();
        assert_eq!(rfc.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 2, 3, 1, 20, 30).unwrap());
        let plain = parse_publish_date("2024-02-03 10:20:30", now).unwrap();
        assert_eq!(plain.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 2, 3, 10, 20, 30).unwrap());
        let day = parse_publish_date("2024-02-03", now).unwrap();
        assert_eq!(day.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap());
        assert_eq!(parse_publish_date("  ", now).unwrap().with_timezone(&Utc), now);
        assert!(matches!(parse_publish_date("yesterday", now), Err(FormError::Validation(_))));
    }

    #[test]
    fn cleared_date_falls_back_to_captured_one() {
        let mut form = BookmarkForm::new();
        form.populate(&meta(), Some(Uuid::new_v4()));
        form.edit(FieldEdit::PublishDate(String::new()));
        let fields = form.validate(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(fields.uploaded_date.to_rfc3339(), "2024-02-03T10:20:30+09:00");
        assert_eq!(fields.favicon_url, None);
    }

    #[tokio::test]
    async fn missing_service_never_reaches_backend() {
        let (repo, _, ctl) = controller();
        let mut form = BookmarkForm::new();
        form.populate(&meta(), None);
        let err = ctl.submit(Uuid::new_v4(), &mut form).await.unwrap_err();
        assert_eq!(err, FormError::Validation("Please select a service.".into()));
        assert!(repo.calls().is_empty());
        assert_eq!(form.state(), FormState::Populated);
    }

    #[tokio::test]
    async fn blank_title_or_bad_date_never_reaches_backend() {
        let (repo, _, ctl) = controller();
        let mut form = BookmarkForm::new();
        form.populate(&meta(), Some(Uuid::new_v4()));
        form.edit(FieldEdit::Title("   ".into()));
        assert!(matches!(ctl.submit(Uuid::new_v4(), &mut form).await, Err(FormError::Validation(_))));
        form.edit(FieldEdit::Title("Post".into()));
        form.edit(FieldEdit::PublishDate("03/02/2024".into()));
        assert!(matches!(ctl.submit(Uuid::new_v4(), &mut form).await, Err(FormError::Validation(_))));
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn valid_submit_inserts_once_and_marks_saved() {
        let (repo, indicator, ctl) = controller();
        let user = Uuid::new_v4();
        let service = Uuid::new_v4();
        let mut form = BookmarkForm::new();
        form.populate(&meta(), Some(service));

        let saved = ctl.submit(user, &mut form).await.unwrap();
        assert_eq!(form.state(), FormState::Saved);
        assert_eq!(form.bookmark_id(), Some(saved.id));
        assert_eq!(repo.writes(), 1);
        let calls = repo.calls();
        assert_eq!(calls[0], RepoCall::FindByUserTitle(user, "Post".into()));
        match &calls[1] {
            RepoCall::Insert(f) => {
                assert_eq!(f.service_id, service);
                assert_eq!(f.last_updated_user_id, user);
                assert_eq!(f.title, "Post");
            }
            other => panic!("unexpected call {other:?}"),
        }
        assert!(indicator.icon_for(&saved.url).await.is_saved());
    }

    #[tokio::test]
    async fn resubmitting_a_saved_form_updates() {
        let (repo, _, ctl) = controller();
        let mut form = BookmarkForm::new();
        form.populate(&meta(), Some(Uuid::new_v4()));
        let first = ctl.submit(Uuid::new_v4(), &mut form).await.unwrap();
        form.edit(FieldEdit::Memo("second pass".into()));
        let second = ctl.submit(Uuid::new_v4(), &mut form).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.memo.as_deref(), Some("second pass"));
        assert!(matches!(repo.calls().last(), Some(RepoCall::Update(id, _)) if *id == first.id));
        assert_eq!(repo.writes(), 2);
    }

    #[tokio::test]
    async fn fresh_form_for_an_existing_title_updates_that_row() {
        let (repo, _, ctl) = controller();
        let user = Uuid::new_v4();
        let mut first = BookmarkForm::new();
        first.populate(&meta(), Some(Uuid::new_v4()));
        let saved = ctl.submit(user, &mut first).await.unwrap();

        let mut again = BookmarkForm::new();
        again.populate(&meta(), Some(Uuid::new_v4()));
        again.edit(FieldEdit::Memo("again".into()));
        let resaved = ctl.submit(user, &mut again).await.unwrap();

        assert_eq!(resaved.id, saved.id);
        assert!(first.was_inserted());
        assert!(!again.was_inserted());
        assert_eq!(again.bookmark_id(), Some(saved.id));
        let inserts = repo.calls().iter().filter(|c| matches!(c, RepoCall::Insert(_))).count();
        assert_eq!(inserts, 1);
        assert!(matches!(repo.calls().last(), Some(RepoCall::Update(id, _)) if *id == saved.id));
    }

    #[tokio::test]
    async fn same_title_from_another_user_is_a_new_row() {
        let (repo, _, ctl) = controller();
        for _ in 0..2 {
            let mut form = BookmarkForm::new();
            form.populate(&meta(), Some(Uuid::new_v4()));
            ctl.submit(Uuid::new_v4(), &mut form).await.unwrap();
        }
        let inserts = repo.calls().iter().filter(|c| matches!(c, RepoCall::Insert(_))).count();
        assert_eq!(inserts, 2);
    }

    #[tokio::test]
    async fn updating_a_vanished_bookmark_is_not_found() {
        let (repo, _, ctl) = controller();
        let gone = Uuid::new_v4();
        let mut form = BookmarkForm::from_submission(
            Some(gone),
            Some(Uuid::new_v4()),
            FormFields { title: "T".into(), url: "https://example.com/t".into(), is_visible: true, ..Default::default() },
        );
        assert_eq!(ctl.submit(Uuid::new_v4(), &mut form).await.unwrap_err(), FormError::NotFound(gone));
        assert_eq!(form.state(), FormState::Edited);
        assert_eq!(repo.calls().len(), 1);
    }

    #[test]
    fn existing_bookmark_form_carries_its_id() {
        let m = Model {
            id: Uuid::new_v4(),
            title: "Stored".into(),
            description: None,
            favicon_url: None,
            twitter_image_url: None,
            url: "https://example.com/stored".into(),
            uploaded_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().into(),
            service_id: Uuid::new_v4(),
            last_updated_user_id: Uuid::new_v4(),
            memo: Some("kept".into()),
            is_visible: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let form = BookmarkForm::for_existing(&m);
        assert_eq!(form.bookmark_id(), Some(m.id));
        assert_eq!(form.service_id(), Some(m.service_id));
        assert_eq!(form.fields().memo, "kept");
        assert!(!form.fields().is_visible);
        let fields = form.validate(m.last_updated_user_id, Utc::now()).unwrap();
        assert_eq!(fields.uploaded_date, m.uploaded_date);
    }

    #[tokio::test]
    async fn backend_failure_returns_raw_message_and_stays_editable() {
        let (repo, indicator, ctl) = controller();
        repo.fail_with(Some("insert or update on table \"bookmarks\" violates foreign key constraint"));
        let mut form = BookmarkForm::new();
        form.populate(&meta(), Some(Uuid::new_v4()));
        let err = ctl.submit(Uuid::new_v4(), &mut form).await.unwrap_err();
        assert_eq!(
            err,
            FormError::Persistence("insert or update on table \"bookmarks\" violates foreign key constraint".into())
        );
        assert_eq!(form.state(), FormState::Edited);
        assert_eq!(repo.calls().len(), 1);
        assert!(!indicator.icon_for("https://example.com/post").await.is_saved());
    }
}
