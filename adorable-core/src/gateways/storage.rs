use std::path::PathBuf;

/// Binary content of files, addressed by a relative storage path.
pub trait FileStorage {
    fn store(&self, path: &str, content: &[u8]) -> anyhow::Result<()>;
    fn read(&self, path: &str) -> anyhow::Result<Vec<u8>>;
    fn remove(&self, path: &str) -> anyhow::Result<()>;
    /// Location on the local file system, if any.
    fn local_path(&self, path: &str) -> Option<PathBuf>;
    /// Public URL of a stored file.
    fn url(&self, path: &str) -> String;
}
