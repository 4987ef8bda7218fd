//! State Hashing for Verification
//!
//! Provides deterministic hashing of league state for:
//! - Cross-replica agreement on post-transition roots
//! - Merkle leaf and node hashing
//! - Journal replay validation

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type RootHash = [u8; 32];

/// Deterministic hasher for league state.
///
/// Wraps SHA-256 with helpers for the scalar types used by the state model.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for tournament metadata.
    pub fn for_meta() -> Self {
        Self::new(b"BRACKET_LEDGER_META_V1")
    }

    /// Create hasher for the final state root.
    pub fn for_state_root() -> Self {
        Self::new(b"BRACKET_LEDGER_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a 32-byte digest.
    #[inline]
    pub fn update_hash(&mut self, hash: &RootHash) {
        self.hasher.update(hash);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> RootHash {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> RootHash {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Render a root hash as lowercase hex with `0x` prefix.
pub fn root_to_hex(root: &RootHash) -> String {
    format!("0x{}", hex::encode(root))
}

/// Parse a root hash from hex, with or without `0x` prefix.
pub fn root_from_hex(s: &str) -> Option<RootHash> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).ok()?;
    bytes.try_into().ok()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_meta();
            hasher.update_u64(12345);
            hasher.update_hash(&[7u8; 32]);
            hasher.update_bytes(b"lions");
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(b"DOMAIN_A", &data);
        let hash2 = hash_with_domain(b"DOMAIN_B", &data);

        assert_ne!(hash1, hash2);
        assert_ne!(hash_with_domain(b"", &data), hash1);
    }

    #[test]
    fn test_hex_roundtrip_accepts_prefix() {
        let root = hash_with_domain(b"TEST", b"root");
        let rendered = root_to_hex(&root);
        assert!(rendered.starts_with("0x"));
        assert_eq!(root_from_hex(&rendered), Some(root));
        assert_eq!(root_from_hex(&rendered[2..]), Some(root));
        assert_eq!(root_from_hex("0xdead"), None);
        assert_eq!(root_from_hex("zz"), None);
    }
}
