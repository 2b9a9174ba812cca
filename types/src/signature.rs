//! Uploaded signature metadata.
//!
//! The encoded image bytes live in a file store; a [`SignatureRecord`] only
//! knows where to find them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SignatureId, UserId};

/// Description given to reference signatures uploaded without one.
pub const DEFAULT_REFERENCE_DESCRIPTION: &str = "Reference signature";

/// Description given to probe uploads.
pub const DEFAULT_PROBE_DESCRIPTION: &str = "Verification signature";

/// Where a file's bytes are kept in the file store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocator {
    pub filename: String,
    pub path: String,
}

/// A signature image owned by exactly one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub id: SignatureId,
    pub owner: UserId,
    pub filename: String,
    pub path: String,
    /// `true` for a standing reference, `false` for a one-off probe.
    pub is_reference: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl SignatureRecord {
    pub fn locator(&self) -> StorageLocator {
        StorageLocator {
            filename: self.filename.clone(),
            path: self.path.clone(),
        }
    }

    /// Ordering used to pick "the" reference: newest first at millisecond
    /// precision, ties broken by id (highest first). Stores index creation
    /// time in milliseconds, so every backend agrees on this order.
    pub fn newest_first(a: &SignatureRecord, b: &SignatureRecord) -> std::cmp::Ordering {
        b.created_at
            .timestamp_millis()
            .cmp(&a.created_at.timestamp_millis())
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// Content type guessed from a filename's extension.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
