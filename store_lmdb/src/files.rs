//! Directory-backed FileStore for uploaded images.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sigver_store::file::{validate_filename, FileStore};
use sigver_store::StoreError;
use sigver_types::StorageLocator;

use crate::LmdbError;

/// Stores each blob as one file directly under `root`.
///
/// Reads resolve `locator.filename` against the current root rather than
/// trusting the stored path, so the uploads directory can be moved.
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// Open (creating if needed) the directory at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LmdbError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }
}

fn io_error(filename: &str, e: std::io::Error) -> StoreError {
    if e.kind() == ErrorKind::NotFound {
        StoreError::NotFound(format!("file {filename}"))
    } else {
        StoreError::Backend(format!("file {filename}: {e}"))
    }
}

impl FileStore for DiskFileStore {
    fn put_file(&self, filename: &str, bytes: &[u8]) -> Result<StorageLocator, StoreError> {
        let path = self.resolve(filename)?;
        std::fs::write(&path, bytes).map_err(|e| io_error(filename, e))?;
        tracing::debug!(file = filename, size = bytes.len(), "stored upload");
        Ok(StorageLocator {
            filename: filename.to_string(),
            path: path.to_string_lossy().into_owned(),
        })
    }

    fn read_file(&self, locator: &StorageLocator) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(&locator.filename)?;
        std::fs::read(path).map_err(|e| io_error(&locator.filename, e))
    }

    fn delete_file(&self, locator: &StorageLocator) -> Result<(), StoreError> {
        let path = self.resolve(&locator.filename)?;
        std::fs::remove_file(path).map_err(|e| io_error(&locator.filename, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::open(dir.path().join("uploads")).unwrap();

        let loc = store.put_file("a.png", b"\x89PNG").unwrap();
        assert_eq!(loc.filename, "a.png");
        assert!(dir.path().join("uploads").join("a.png").is_file());
        assert_eq!(store.read_file(&loc).unwrap(), b"\x89PNG");

        store.delete_file(&loc).unwrap();
        assert!(!dir.path().join("uploads").join("a.png").exists());
        assert!(store.read_file(&loc).unwrap_err().is_not_found());
    }

    #[test]
    fn traversal_names_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.put_file("../escape.png", b"x"),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn reads_follow_the_current_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskFileStore::open(dir.path()).unwrap();
        let mut loc = store.put_file("moved.png", b"data").unwrap();
        loc.path = "/somewhere/else/moved.png".into();
        assert_eq!(store.read_file(&loc).unwrap(), b"data");
    }
}
