use adorable_core::gateways::storage::FileStorage;
use anyhow::{bail, Result};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Stores files below a directory of the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn try_new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            base_url: base_url.into(),
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let rel = Path::new(path);
        if path.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            bail!("Invalid storage path '{path}'");
        }
        Ok(self.root.join(rel))
    }
}

impl FileStorage for LocalFileStorage {
    fn store(&self, path: &str, content: &[u8]) -> Result<()> {
        let file_path = self.resolve(path)?;
        if let Some(dir) = file_path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&file_path, content)?;
        log::debug!("Stored {} bytes at {}", content.len(), file_path.display());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn remove(&self, path: &str) -> Result<()> {
        let file_path = self.resolve(path)?;
        if file_path.exists() {
            fs::remove_file(file_path)?;
        }
        Ok(())
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.resolve(path).ok()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, LocalFileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::try_new(dir.path(), "https://files.example.com/").unwrap();
        (dir, storage)
    }

    #[test]
    fn store_read_and_remove() {
        let (_dir, storage) = storage();
        storage.store("users/u1/avatar.png", b"png").unwrap();
        assert_eq!(b"png".to_vec(), storage.read("users/u1/avatar.png").unwrap());
        assert!(storage.local_path("users/u1/avatar.png").unwrap().exists());
        storage.remove("users/u1/avatar.png").unwrap();
        assert!(storage.read("users/u1/avatar.png").is_err());
        // removing twice is fine
        storage.remove("users/u1/avatar.png").unwrap();
    }

    #[test]
    fn reject_escaping_paths() {
        let (_dir, storage) = storage();
        assert!(storage.store("../evil", b"x").is_err());
        assert!(storage.store("/etc/passwd", b"x").is_err());
        assert!(storage.store("", b"x").is_err());
        assert!(storage.local_path("a/../../b").is_none());
    }

    #[test]
    fn public_urls() {
        let (_dir, storage) = storage();
        assert_eq!(
            "https://files.example.com/places/p1/1.jpg",
            storage.url("places/p1/1.jpg")
        );
    }
}
