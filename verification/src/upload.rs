//! Uploaded files and the names they are stored under.

use chrono::{DateTime, Utc};
use sigver_types::{SignatureId, UserId};

/// Longest extension kept from a client filename, dot excluded.
const MAX_EXTENSION_LEN: usize = 8;

/// A file received from a client.
#[derive(Clone, Debug, Default)]
pub struct Upload {
    /// Name the client sent, used only for its extension.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension including the dot, or empty if the client name
    /// has none or an unusable one.
    pub fn extension(&self) -> String {
        let Some((_, ext)) = self.filename.rsplit_once('.') else {
            return String::new();
        };
        if ext.is_empty()
            || ext.len() > MAX_EXTENSION_LEN
            || !ext.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return String::new();
        }
        format!(".{}", ext.to_ascii_lowercase())
    }
}

/// Server-side name for an upload: `{prefix}{owner}-{millis}-{tag}{ext}`.
///
/// `tag` keeps two uploads in the same millisecond apart. Client names never
/// reach the file store beyond their extension.
pub fn stored_filename(
    prefix: &str,
    owner: &UserId,
    at: DateTime<Utc>,
    tag: &SignatureId,
    upload: &Upload,
) -> String {
    let tag = tag.to_string();
    format!(
        "{prefix}{owner}-{}-{}{}",
        at.timestamp_millis(),
        &tag[..8],
        upload.extension()
    )
}
