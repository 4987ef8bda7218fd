//! # Bracket Ledger
//!
//! Deterministic tournament-bracket state machine with verifiable state roots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      BRACKET LEDGER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── hash.rs     - Domain-separated SHA-256                  │
//! │  └── codec.rs    - Canonical record encoding                 │
//! │                                                              │
//! │  league/         - State machine (deterministic)             │
//! │  ├── state.rs    - League state model                        │
//! │  ├── transition.rs - One handler per action                  │
//! │  ├── bracket.rs  - Leaderboard, rounds, byes                 │
//! │  ├── query.rs    - Read-only views                           │
//! │  └── machine.rs  - Sequencer contract, auth, journaling      │
//! │                                                              │
//! │  proof/          - Commitment and verification               │
//! │  ├── merkle.rs   - Sorted Merkle tree                        │
//! │  ├── mmr.rs      - Merkle Mountain Range                     │
//! │  ├── commitment.rs - State root                              │
//! │  └── verify.rs   - Journal replay                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `league/` and `proof/` modules are **100% deterministic**:
//! - No HashMap (uses BTreeMap and ordered Vecs)
//! - No system time: every timestamp is supplied by the sequencer
//! - Canonical, schema-ordered byte encodings for hashing
//!
//! Given an identical genesis, rules and action sequence, every replica
//! computes **identical roots**.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod league;
pub mod proof;

// Re-export commonly used types
pub use config::{LeagueRules, NodeConfig, PlayerScoring};
pub use crate::core::hash::RootHash;
pub use league::{Action, LeagueMachine, LeagueState, SequencedAction};
pub use proof::compute_root;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
