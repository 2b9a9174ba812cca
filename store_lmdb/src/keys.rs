//! Binary key layouts.
//!
//! All identifiers are 16 raw UUID bytes, so composite keys that start with
//! an owner id can be range-scanned by that prefix.
//!
//! | database            | key                                         | value            |
//! |---------------------|---------------------------------------------|------------------|
//! | `users`             | `user_id`                                   | bincode `User`   |
//! | `users_by_email`    | normalised email bytes                      | `user_id`        |
//! | `signatures`        | `signature_id`                              | bincode record   |
//! | `signatures_by_owner` | `owner ++ flag ++ created_be ++ sig_id`   | empty            |
//! | `history`           | `user_id ++ seq_be`                         | bincode record   |
//! | `history_seq`       | `user_id`                                   | `seq_be`         |
//! | `revoked_sessions`  | `session_id`                                | `expires_be`     |
//! | `meta`              | ascii name                                  | raw bytes        |

use chrono::{DateTime, Utc};
use sigver_types::{SignatureRecord, UserId};

/// Owner-index prefix selecting one owner's references or probes.
pub fn owner_prefix(owner: &UserId, is_reference: bool) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.extend_from_slice(owner.as_bytes());
    key.push(is_reference as u8);
    key
}

/// Full owner-index key. Sorts by creation time, then id, within a prefix.
pub fn owner_index_key(record: &SignatureRecord) -> Vec<u8> {
    let mut key = owner_prefix(&record.owner, record.is_reference);
    key.extend_from_slice(&sortable_millis(record.created_at));
    key.extend_from_slice(record.id.as_bytes());
    key
}

/// History key `user_id ++ seq_be`.
pub fn history_key(user: &UserId, seq: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(user.as_bytes());
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// Millisecond timestamp encoded so that byte order equals time order,
/// including instants before the epoch.
pub fn sortable_millis(at: DateTime<Utc>) -> [u8; 8] {
    ((at.timestamp_millis() as u64) ^ (1 << 63)).to_be_bytes()
}

pub fn millis_from_sortable(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1 << 63)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sortable_millis_preserves_order_across_epoch() {
        let before = Utc.timestamp_millis_opt(-5).unwrap();
        let epoch = Utc.timestamp_millis_opt(0).unwrap();
        let after = Utc.timestamp_millis_opt(5).unwrap();
        assert!(sortable_millis(before) < sortable_millis(epoch));
        assert!(sortable_millis(epoch) < sortable_millis(after));
        assert_eq!(millis_from_sortable(sortable_millis(before)), -5);
    }

    #[test]
    fn history_keys_sort_by_sequence() {
        let user = UserId::generate();
        assert!(history_key(&user, 2) < history_key(&user, 10));
        assert!(history_key(&user, 255) < history_key(&user, 256));
    }
}
