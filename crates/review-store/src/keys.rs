//! Key encoding utilities for `RocksDB`.
//!
//! All integers are big-endian so that lexicographic key order matches
//! numeric order. Timestamps have their sign bit flipped for the same reason.

use chrono::{DateTime, Utc};
use review_core::{ProductId, ReviewId};

const SIGN_BIT: u64 = 1 << 63;

/// Encode a timestamp as 8 order-preserving bytes (microsecond precision).
#[must_use]
#[allow(clippy::cast_sign_loss)] // sign is folded into the flipped top bit
pub fn timestamp_bytes(at: &DateTime<Utc>) -> [u8; 8] {
    ((at.timestamp_micros() as u64) ^ SIGN_BIT).to_be_bytes()
}

/// Create a review key from a review ID.
#[must_use]
pub fn review_key(id: ReviewId) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

/// Create a creation-time index key.
///
/// Format: `created_at (8 bytes) || review_id (8 bytes)`
#[must_use]
pub fn created_index_key(created_at: &DateTime<Utc>, id: ReviewId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16);
    key.extend_from_slice(&timestamp_bytes(created_at));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Create a product index key.
///
/// Format: `product_id (8 bytes) || created_at (8 bytes) || review_id (8 bytes)`
#[must_use]
pub fn product_index_key(product_id: ProductId, created_at: &DateTime<Utc>, id: ReviewId) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(&product_id.to_be_bytes());
    key.extend_from_slice(&timestamp_bytes(created_at));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// Prefix shared by every product index key of `product_id`.
#[must_use]
pub fn product_index_prefix(product_id: ProductId) -> Vec<u8> {
    product_id.to_be_bytes().to_vec()
}

/// Smallest key sorting after every product index key of `product_id`'s prefix.
///
/// Used as the seek target for reverse (newest first) scans.
#[must_use]
pub fn product_index_upper_bound(product_id: ProductId) -> Vec<u8> {
    let mut key = product_index_prefix(product_id);
    key.extend_from_slice(&[0xFF; 16]);
    key
}

/// Extract the review ID from the trailing 8 bytes of an index key.
///
/// Returns `None` if the key is shorter than 8 bytes.
#[must_use]
pub fn review_id_from_index_key(key: &[u8]) -> Option<ReviewId> {
    let start = key.len().checked_sub(8)?;
    let bytes: [u8; 8] = key[start..].try_into().ok()?;
    Some(ReviewId::from_be_bytes(bytes))
}

/// Create a product key from a product ID.
#[must_use]
pub fn product_key(id: ProductId) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_sort_chronologically() {
        let before_epoch = Utc.timestamp_opt(-10, 0).unwrap();
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let later = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();

        assert!(timestamp_bytes(&before_epoch) < timestamp_bytes(&epoch));
        assert!(timestamp_bytes(&epoch) < timestamp_bytes(&later));
    }

    #[test]
    fn created_index_key_format() {
        let at = Utc.timestamp_opt(1000, 0).unwrap();
        let key = created_index_key(&at, ReviewId::new(42));
        assert_eq!(key.len(), 16);
        assert_eq!(&key[..8], timestamp_bytes(&at));
        assert_eq!(review_id_from_index_key(&key), Some(ReviewId::new(42)));
    }

    #[test]
    fn product_index_key_format() {
        let at = Utc.timestamp_opt(1000, 0).unwrap();
        let key = product_index_key(ProductId::new(7), &at, ReviewId::new(9));
        assert_eq!(key.len(), 24);
        assert!(key.starts_with(&product_index_prefix(ProductId::new(7))));
        assert!(key < product_index_upper_bound(ProductId::new(7)));
        assert!(key > product_index_upper_bound(ProductId::new(6)));
        assert_eq!(review_id_from_index_key(&key), Some(ReviewId::new(9)));
    }

    #[test]
    fn short_index_key_has_no_review() {
        assert_eq!(review_id_from_index_key(&[1, 2, 3]), None);
    }
}
