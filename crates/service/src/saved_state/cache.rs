use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};

use configs::ExtensionConfig;

use crate::errors::ServiceError;

/// URL -> saved flag, persisted as one JSON object.
///
/// The extension's local record of pages it has seen saved. A missing or corrupt
/// file starts empty; every write rewrites the file.
pub struct SavedStateCache {
    inner: RwLock<HashMap<String, bool>>,
    file_path: Option<PathBuf>,
}

impl SavedStateCache {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        let map: HashMap<String, bool> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };
        Ok(Arc::new(Self { inner: RwLock::new(map), file_path: Some(file_path) }))
    }

    /// The cache file named by `[extension] saved_cache_path`.
    pub async fn from_config(cfg: &ExtensionConfig) -> Result<Arc<Self>, ServiceError> {
        Self::open(&cfg.saved_cache_path).await
    }

    /// Cache that never touches disk.
    pub fn in_memory() -> Arc<Self> {
        Arc::new(Self { inner: RwLock::new(HashMap::new()), file_path: None })
    }

    async fn save(&self, map: &HashMap<String, bool>) -> Result<(), ServiceError> {
        let Some(path) = &self.file_path else { return Ok(()) };
        let data = serde_json::to_vec(map).map_err(|e| ServiceError::Storage(e.to_string()))?;
        fs::write(path, data).await.map_err(|e| ServiceError::Storage(e.to_string()))
    }

    pub async fn is_saved(&self, url: &str) -> bool {
        self.inner.read().await.get(url).copied().unwrap_or(false)
    }

    pub async fn mark_saved(&self, url: &str) -> Result<(), ServiceError> {
        let mut map = self.inner.write().await;
        if map.insert(url.to_string(), true) == Some(true) {
            return Ok(());
        }
        self.save(&map).await
    }

    /// Drops `url`; returns whether it was recorded.
    pub async fn forget(&self, url: &str) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let existed = map.remove(url).is_some();
        if existed {
            self.save(&map).await?;
        }
        Ok(existed)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marks_persist_across_reopen() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("saved_pages_{}.json", uuid::Uuid::new_v4()));
        let cache = SavedStateCache::open(&tmp).await?;
        assert!(cache.is_empty().await);

        cache.mark_saved("https://example.com/a").await?;
        cache.mark_saved("https://example.com/b").await?;
        assert!(cache.forget("https://example.com/b").await?);
        assert!(!cache.forget("https://example.com/b").await?);

        let reopened = SavedStateCache::open(&tmp).await?;
        assert!(reopened.is_saved("https://example.com/a").await);
        assert!(!reopened.is_saved("https://example.com/b").await);
        assert_eq!(reopened.len().await, 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn opens_configured_path() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("buzzmemo_{}", uuid::Uuid::new_v4())).join("saved.json");
        let cfg = ExtensionConfig { saved_cache_path: tmp.to_string_lossy().into_owned(), ..Default::default() };
        let cache = SavedStateCache::from_config(&cfg).await?;
        cache.mark_saved("https://example.com/a").await?;
        assert!(tokio::fs::try_exists(&tmp).await?);
        if let Some(dir) = tmp.parent() {
            let _ = tokio::fs::remove_dir_all(dir).await;
        }
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("saved_pages_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"{not json").await?;
        let cache = SavedStateCache::open(&tmp).await?;
        assert!(cache.is_empty().await);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
