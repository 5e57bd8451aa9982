use async_trait::async_trait;
use uuid::Uuid;

use models::bookmark::{BookmarkFields, Model};

use crate::errors::ServiceError;

/// Repository abstraction for bookmark persistence.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn insert(&self, fields: BookmarkFields) -> Result<Model, ServiceError>;
    async fn update(&self, id: Uuid, fields: BookmarkFields) -> Result<Model, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError>;
    async fn find_by_user_title(&self, user_id: Uuid, title: &str) -> Result<Option<Model>, ServiceError>;
    /// Newest `uploaded_date` first.
    async fn list_by_service(&self, service_id: Uuid) -> Result<Vec<Model>, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

/// In-memory repository that records every call, for tests.
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum RepoCall {
        Insert(BookmarkFields),
        Update(Uuid, BookmarkFields),
        Get(Uuid),
        FindByUserTitle(Uuid, String),
        ListByService(Uuid),
        Delete(Uuid),
    }

    #[derive(Default)]
    pub struct MockBookmarkRepository {
        rows: Mutex<HashMap<Uuid, Model>>,
        calls: Mutex<Vec<RepoCall>>,
        failure: Mutex<Option<String>>,
    }

    impl MockBookmarkRepository {
        pub fn calls(&self) -> Vec<RepoCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn writes(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, RepoCall::Insert(_) | RepoCall::Update(..)))
                .count()
        }

        /// Every later call fails with `message` until cleared with `None`.
        pub fn fail_with(&self, message: Option<&str>) {
            *self.failure.lock().unwrap() = message.map(str::to_string);
        }

        fn record(&self, call: RepoCall) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(call);
            match self.failure.lock().unwrap().as_ref() {
                Some(m) => Err(ServiceError::Db(m.clone())),
                None => Ok(()),
            }
        }

        fn to_model(id: Uuid, f: BookmarkFields, created_at: Option<sea_orm::prelude::DateTimeWithTimeZone>) -> Model {
            let now = Utc::now().into();
            Model {
                id,
                title: f.title,
                description: f.description,
                favicon_url: f.favicon_url,
                twitter_image_url: f.twitter_image_url,
                url: f.url,
                uploaded_date: f.uploaded_date,
                service_id: f.service_id,
                last_updated_user_id: f.last_updated_user_id,
                memo: f.memo,
                is_visible: f.is_visible,
                created_at: created_at.unwrap_or(now),
                updated_at: now,
            }
        }
    }

    #[async_trait]
    impl BookmarkRepository for MockBookmarkRepository {
        async fn insert(&self, fields: BookmarkFields) -> Result<Model, ServiceError> {
            self.record(RepoCall::Insert(fields.clone()))?;
            models::bookmark::validate_fields(&fields)?;
            let m = Self::to_model(Uuid::new_v4(), fields, None);
            self.rows.lock().unwrap().insert(m.id, m.clone());
            Ok(m)
        }

        async fn update(&self, id: Uuid, fields: BookmarkFields) -> Result<Model, ServiceError> {
            self.record(RepoCall::Update(id, fields.clone()))?;
            models::bookmark::validate_fields(&fields)?;
            let mut rows = self.rows.lock().unwrap();
            let existing = rows.get(&id).ok_or_else(|| ServiceError::not_found("bookmark"))?;
            let m = Self::to_model(id, fields, Some(existing.created_at));
            rows.insert(id, m.clone());
            Ok(m)
        }

        async fn get(&self, id: Uuid) -> Result<Option<Model>, ServiceError> {
            self.record(RepoCall::Get(id))?;
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn find_by_user_title(&self, user_id: Uuid, title: &str) -> Result<Option<Model>, ServiceError> {
            self.record(RepoCall::FindByUserTitle(user_id, title.to_string()))?;
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .values()
                .find(|m| m.last_updated_user_id == user_id && m.title == title)
                .cloned())
        }

        async fn list_by_service(&self, service_id: Uuid) -> Result<Vec<Model>, ServiceError> {
            self.record(RepoCall::ListByService(service_id))?;
            let rows = self.rows.lock().unwrap();
            let mut out: Vec<Model> = rows.values().filter(|m| m.service_id == service_id).cloned().collect();
            out.sort_by(|a, b| b.uploaded_date.cmp(&a.uploaded_date));
            Ok(out)
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
            self.record(RepoCall::Delete(id))?;
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }
    }
}
