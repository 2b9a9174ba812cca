//! Nullable file store: uploads kept in memory.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use sigver_store::file::{validate_filename, FileStore};
use sigver_store::StoreError;
use sigver_types::StorageLocator;

pub struct NullFileStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl NullFileStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `put_file` fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Drop a stored blob behind the service's back.
    pub fn remove(&self, filename: &str) {
        self.files.lock().unwrap().remove(filename);
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.lock().unwrap().contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NullFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStore for NullFileStore {
    fn put_file(&self, filename: &str, bytes: &[u8]) -> Result<StorageLocator, StoreError> {
        validate_filename(filename)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(filename.to_string(), bytes.to_vec());
        Ok(StorageLocator {
            filename: filename.to_string(),
            path: format!("mem://{filename}"),
        })
    }

    fn read_file(&self, locator: &StorageLocator) -> Result<Vec<u8>, StoreError> {
        self.files
            .lock()
            .unwrap()
            .get(&locator.filename)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("file {}", locator.filename)))
    }

    fn delete_file(&self, locator: &StorageLocator) -> Result<(), StoreError> {
        self.files
            .lock()
            .unwrap()
            .remove(&locator.filename)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("file {}", locator.filename)))
    }
}
