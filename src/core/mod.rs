//! Core deterministic primitives.
//!
//! Hashing and canonical encoding. Nothing here depends on platform,
//! iteration order of hashed containers, or wall-clock time.

pub mod hash;
pub mod codec;

// Re-export core types
pub use hash::{RootHash, StateHasher, root_to_hex, root_from_hex};
pub use codec::{CanonicalEncode, CanonicalEncoder};
