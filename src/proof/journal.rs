//! Action Journal
//!
//! Ordered record of every sequenced action a machine saw, with its outcome
//! and the post-transition root. Enough to replay and verify a league from
//! genesis. Compact encoding is bincode.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::RootHash;
use crate::league::action::SequencedAction;

/// Current journal version.
pub const JOURNAL_VERSION: u8 = 1;

/// What happened to one action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalOutcome {
    /// Applied; root after the transition.
    Applied {
        /// Post-transition root
        root: RootHash,
    },
    /// Rejected without touching state.
    Rejected {
        /// Stable error code
        code: String,
    },
}

impl JournalOutcome {
    /// Short label for logs and mismatch reports.
    pub fn label(&self) -> String {
        match self {
            JournalOutcome::Applied { root } => format!("applied {}", hex::encode(&root[..4])),
            JournalOutcome::Rejected { code } => format!("rejected {}", code),
        }
    }
}

/// One journal line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 0
    pub sequence: u64,
    /// The action as sequenced
    pub action: SequencedAction,
    /// Outcome
    pub outcome: JournalOutcome,
}

/// Complete journal for one league.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionJournal {
    /// Version for forward compatibility.
    pub version: u8,
    /// Root of the genesis state.
    pub genesis_root: RootHash,
    /// Every action in sequencer order.
    pub entries: Vec<JournalEntry>,
    /// Root after the last entry, set by `finalize`.
    pub final_root: Option<RootHash>,
}

impl ActionJournal {
    /// Start a journal for a genesis root.
    pub fn new(genesis_root: RootHash) -> Self {
        Self {
            version: JOURNAL_VERSION,
            genesis_root,
            entries: Vec::new(),
            final_root: None,
        }
    }

    /// Append an entry and return its sequence number.
    pub fn record(&mut self, action: SequencedAction, outcome: JournalOutcome) -> u64 {
        let sequence = self.entries.len() as u64;
        self.entries.push(JournalEntry { sequence, action, outcome });
        sequence
    }

    /// Seal with the final root.
    pub fn finalize(&mut self, final_root: RootHash) {
        self.final_root = Some(final_root);
    }

    /// Whether `finalize` was called.
    pub fn is_complete(&self) -> bool {
        self.final_root.is_some()
    }

    /// Number of applied entries.
    pub fn applied_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, JournalOutcome::Applied { .. }))
            .count()
    }

    /// Number of rejected entries.
    pub fn rejected_count(&self) -> usize {
        self.entries.len() - self.applied_count()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, JournalError> {
        bincode::serialize(self).map_err(|e| JournalError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bytes, rejecting unknown versions.
    pub fn from_bytes(data: &[u8]) -> Result<Self, JournalError> {
        let journal: Self = bincode::deserialize(data)
            .map_err(|e| JournalError::DeserializationFailed(e.to_string()))?;
        if journal.version != JOURNAL_VERSION {
            return Err(JournalError::VersionMismatch {
                expected: JOURNAL_VERSION,
                got: journal.version,
            });
        }
        Ok(journal)
    }
}

/// Errors that can occur with journals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// Serialization failed.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// Deserialization failed.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
    /// Version mismatch.
    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version
        expected: u8,
        /// Version found
        got: u8,
    },
}
