//! JSON file-backed store with atomic writes.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    tokio::fs,
    tracing::{debug, warn},
};

use crate::{Result, schema::StoreDocument, store::StorePersistence};

/// Single JSON file holding the whole configuration document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write: write to temp, rename over target, keep `.bak`.
    async fn atomic_write(&self, json: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            if let Err(e) = fs::copy(&self.path, &bak).await {
                warn!(path = %bak.display(), error = %e, "failed to back up config");
            }
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorePersistence for JsonFileStore {
    async fn load(&self) -> Result<StoreDocument> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!(path = %self.path.display(), "no config file, starting empty");
            return Ok(StoreDocument::default());
        }
        let raw = fs::read_to_string(&self.path).await?;
        match serde_json::from_str(&raw) {
            Ok(document) => Ok(document),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "config file is corrupt, starting empty"
                );
                Ok(StoreDocument::default())
            },
        }
    }

    async fn save(&self, document: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        self.atomic_write(&json).await?;
        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::RetentionPolicy, tempfile::TempDir};

    fn sample() -> StoreDocument {
        let mut doc = StoreDocument::default();
        doc.policies
            .insert("100".into(), RetentionPolicy::new("1", 5));
        doc.policies.insert("200".into(), RetentionPolicy {
            keep_pinned: true,
            keep_bot_embeds: true,
            enabled: false,
            ..RetentionPolicy::new("1", 0)
        });
        doc.management_roles
            .insert("1".into(), vec!["10".into(), "11".into()]);
        doc.deleted_message_count.insert("100".into(), 41);
        doc
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("autodelete_config.json"));
        assert_eq!(store.load().await.unwrap(), StoreDocument::default());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("autodelete_config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert_eq!(store.load().await.unwrap(), StoreDocument::default());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("autodelete_config.json"));
        let doc = sample();
        store.save(&doc).await.unwrap();

        let reopened = JsonFileStore::new(store.path());
        assert_eq!(reopened.load().await.unwrap(), doc);
    }

    #[tokio::test]
    async fn second_save_keeps_backup() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("autodelete_config.json"));
        store.save(&StoreDocument::default()).await.unwrap();
        store.save(&sample()).await.unwrap();

        let bak = tmp.path().join("autodelete_config.json.bak");
        assert!(bak.exists());
        let previous: StoreDocument =
            serde_json::from_str(&std::fs::read_to_string(bak).unwrap()).unwrap();
        assert_eq!(previous, StoreDocument::default());
        assert!(!tmp.path().join("autodelete_config.json.tmp").exists());
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("nested/dir/config.json"));
        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), sample());
    }
}
