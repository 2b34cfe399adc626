use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use uuid::Uuid;

use crate::domain::ports::FileStore;

/// Attachment storage on the local filesystem. Content references are file
/// names relative to the root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileStore { root: root.into() }
    }

    fn resolve(&self, content_ref: &str) -> Result<PathBuf, anyhow::Error> {
        // refs are plain file names; anything with a path component is not
        // one of ours
        if Path::new(content_ref).file_name() != Some(content_ref.as_ref()) {
            bail!("invalid content reference: {content_ref}");
        }
        Ok(self.root.join(content_ref))
    }
}

impl FileStore for LocalFileStore {
    type Err = anyhow::Error;

    async fn store(&self, name: String, bytes: Vec<u8>) -> Result<String, Self::Err> {
        let base = Path::new(&name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment");
        let content_ref = format!("{}_{}", Uuid::new_v4(), base);
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating attachment root {}", self.root.display()))?;
        let path = self.root.join(&content_ref);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing attachment {}", path.display()))?;
        Ok(content_ref)
    }

    async fn delete(&self, content_ref: String) -> Result<(), Self::Err> {
        let path = self.resolve(&content_ref)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("removing attachment {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_under_a_unique_name_and_deletes() {
        let dir = std::env::temp_dir().join(format!("attachments-{}", Uuid::new_v4()));
        let store = LocalFileStore::new(&dir);

        let content_ref = store
            .store("photo.jpg".to_string(), b"bytes".to_vec())
            .await
            .unwrap();
        assert!(content_ref.ends_with("photo.jpg"));
        assert_eq!(tokio::fs::read(dir.join(&content_ref)).await.unwrap(), b"bytes");

        store.delete(content_ref.clone()).await.unwrap();
        assert!(!dir.join(&content_ref).exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn strips_client_supplied_directories() {
        let dir = std::env::temp_dir().join(format!("attachments-{}", Uuid::new_v4()));
        let store = LocalFileStore::new(&dir);

        let content_ref = store
            .store("../../etc/passwd".to_string(), b"x".to_vec())
            .await
            .unwrap();
        assert!(!content_ref.contains('/'));
        assert!(dir.join(&content_ref).exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_traversal_on_delete() {
        let store = LocalFileStore::new("/tmp/attachments");
        assert!(store.delete("../outside".to_string()).await.is_err());
    }
}
