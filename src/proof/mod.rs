//! Commitment and Verification
//!
//! Provides verifiable league state through:
//! - Sorted Merkle trees for set-like collections
//! - Merkle Mountain Ranges for append-only collections
//! - Full and incremental state roots
//! - Action journals and verification by deterministic replay
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF SYSTEM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  merkle.rs       - Sorted binary Merkle tree + proofs       │
//! │  mmr.rs          - Merkle Mountain Range (append/update)    │
//! │  commitment.rs   - State root, sub-roots, incremental cache │
//! │  journal.rs      - Ordered action journal (bincode)         │
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod merkle;
pub mod mmr;
pub mod commitment;
pub mod journal;
pub mod verify;

// Re-export key types
pub use merkle::{MerkleTree, MerkleProof};
pub use mmr::MerkleMountainRange;
pub use commitment::{compute_root, sub_roots, prove_player, prove_team, StateCommitment, SubRoots};
pub use journal::{ActionJournal, JournalEntry, JournalOutcome, JournalError, JOURNAL_VERSION};
pub use verify::{verify_journal, VerificationResult, VerificationError};
