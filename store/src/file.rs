//! Storage trait for signature and profile image bytes.

use crate::StoreError;
use sigver_types::StorageLocator;

/// Flat namespace of named blobs.
pub trait FileStore: Send + Sync {
    /// Store `bytes` under `filename`. Filenames must be a single path
    /// component; anything else is [`StoreError::InvalidInput`].
    fn put_file(&self, filename: &str, bytes: &[u8]) -> Result<StorageLocator, StoreError>;

    fn read_file(&self, locator: &StorageLocator) -> Result<Vec<u8>, StoreError>;

    fn delete_file(&self, locator: &StorageLocator) -> Result<(), StoreError>;
}

/// Reject names that could escape the store's namespace.
pub fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let bad = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidInput(format!(
            "invalid filename '{filename}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_accepted() {
        assert!(validate_filename("abc-123.png").is_ok());
        assert!(validate_filename("verify-x.jpeg").is_ok());
    }

    #[test]
    fn traversal_is_rejected() {
        for name in ["", ".", "..", "../etc/passwd", "a/b", "a\\b", "nul\0"] {
            assert!(validate_filename(name).is_err(), "{name:?} accepted");
        }
    }
}
