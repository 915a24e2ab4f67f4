//! Per-order storage of fulfilled website bundles.

use std::path::{Path, PathBuf};

use crate::archive::{BundleFile, normalize_relative_path};
use crate::{AppError, AppResult};

const ARCHIVE_DIR: &str = "_archives";

/// Storage of website bundles, keyed by order id.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replace the whole bundle of an order.
    async fn replace(&self, order_id: &str, files: Vec<BundleFile>) -> AppResult<()>;

    /// Load every file of an order's bundle, sorted by path.
    async fn load(&self, order_id: &str) -> AppResult<Vec<BundleFile>>;

    /// Add or overwrite a single file in an order's bundle.
    async fn put_file(&self, order_id: &str, file: BundleFile) -> AppResult<()>;

    /// Cache a packed archive, overwriting any earlier one with the same name.
    async fn store_archive(&self, archive_name: &str, bytes: &[u8]) -> AppResult<()>;
}

/// Artifact store on the local filesystem.
///
/// Layout: `{root}/{order_id}/...` for bundles and `{root}/_archives/` for
/// cached zip files.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn order_dir(&self, order_id: &str) -> AppResult<PathBuf> {
        single_component(order_id).map(|name| self.root.join(name))
    }

    async fn write_files(dir: &Path, files: &[BundleFile]) -> AppResult<()> {
        tokio::fs::create_dir_all(dir).await?;
        for file in files {
            let relative = normalize_relative_path(Path::new(&file.path)).ok_or_else(|| {
                AppError::Storage(format!("Refusing to write unsafe path: {}", file.path))
            })?;
            let path = dir.join(relative);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &file.contents).await?;
        }
        Ok(())
    }
}

fn single_component(name: &str) -> AppResult<&str> {
    let valid = !name.is_empty()
        && name != ARCHIVE_DIR
        && !name.starts_with('.')
        && !name.contains(['/', '\\']);
    if valid {
        Ok(name)
    } else {
        Err(AppError::Storage(format!("Invalid storage key: {name}")))
    }
}

async fn remove_dir_if_present(path: &Path) -> AppResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn replace(&self, order_id: &str, files: Vec<BundleFile>) -> AppResult<()> {
        let target = self.order_dir(order_id)?;
        let staging = self
            .root
            .join(format!(".staging-{order_id}-{}", uuid::Uuid::new_v4().simple()));

        if let Err(e) = Self::write_files(&staging, &files).await {
            if let Err(cleanup) = remove_dir_if_present(&staging).await {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %cleanup,
                    "Failed to remove staging directory"
                );
            }
            return Err(e);
        }

        remove_dir_if_present(&target).await?;
        tokio::fs::rename(&staging, &target).await?;

        tracing::debug!(order_id = %order_id, files = files.len(), "Replaced bundle");
        Ok(())
    }

    async fn load(&self, order_id: &str) -> AppResult<Vec<BundleFile>> {
        let root = self.order_dir(order_id)?;
        let mut files = Vec::new();
        let mut pending = vec![(root, String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = if prefix.is_empty() {
                    name
                } else {
                    format!("{prefix}/{name}")
                };

                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), path));
                } else {
                    let contents = tokio::fs::read(entry.path()).await?;
                    files.push(BundleFile { path, contents });
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn put_file(&self, order_id: &str, file: BundleFile) -> AppResult<()> {
        let dir = self.order_dir(order_id)?;
        Self::write_files(&dir, std::slice::from_ref(&file)).await
    }

    async fn store_archive(&self, archive_name: &str, bytes: &[u8]) -> AppResult<()> {
        let name = single_component(archive_name)?;
        let dir = self.root.join(ARCHIVE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(name), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replace_discards_previous_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_path_buf());

        store
            .replace("order1", vec![BundleFile::new("old.html", "old")])
            .await
            .unwrap();
        store
            .replace(
                "order1",
                vec![
                    BundleFile::new("index.html", "<p>new</p>"),
                    BundleFile::new("css/site.css", "p{}"),
                ],
            )
            .await
            .unwrap();

        let files = store.load("order1").await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["css/site.css", "index.html"]);
    }

    #[tokio::test]
    async fn test_failed_replace_leaves_no_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_path_buf());

        store
            .replace("order1", vec![BundleFile::new("index.html", "kept")])
            .await
            .unwrap();
        let result = store
            .replace(
                "order1",
                vec![
                    BundleFile::new("ok.html", "ok"),
                    BundleFile::new("../escape.html", "x"),
                ],
            )
            .await;
        assert!(result.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".staging-"))
            .collect();
        assert!(leftovers.is_empty());
        assert_eq!(
            store.load("order1").await.unwrap(),
            vec![BundleFile::new("index.html", "kept")]
        );
    }

    #[tokio::test]
    async fn test_load_missing_order_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_path_buf());
        assert!(store.load("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_path_buf());

        assert!(store.load("../etc").await.is_err());
        assert!(store.load(ARCHIVE_DIR).await.is_err());
        assert!(
            store
                .put_file("order1", BundleFile::new("../x.html", "x"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_store_archive_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path().to_path_buf());

        store.store_archive("TMP-1_website.zip", b"one").await.unwrap();
        store.store_archive("TMP-1_website.zip", b"two").await.unwrap();

        let cached = std::fs::read(dir.path().join(ARCHIVE_DIR).join("TMP-1_website.zip")).unwrap();
        assert_eq!(cached, b"two");
    }
}
