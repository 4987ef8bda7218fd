//! Verification API
//!
//! Verify a league by deterministic replay of its journal from genesis.

use thiserror::Error;

use crate::config::LeagueRules;
use crate::core::hash::{root_to_hex, RootHash};
use crate::league::genesis::GenesisError;
use crate::league::machine::{Authorizer, LeagueMachine};
use crate::league::state::LeagueState;
use crate::proof::journal::{ActionJournal, JournalOutcome};

/// Verification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Root after replaying every entry that was checked.
    pub computed_final_root: RootHash,

    /// Final root claimed by the journal.
    pub expected_final_root: Option<RootHash>,

    /// Entries replayed before stopping.
    pub entries_checked: usize,

    /// First divergence, if verification failed.
    pub error: Option<VerificationError>,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Genesis document itself is malformed.
    #[error("invalid genesis: {0}")]
    InvalidGenesis(#[from] GenesisError),

    /// Journal was never finalized.
    #[error("journal is incomplete")]
    IncompleteJournal,

    /// Genesis root differs from the journal header.
    #[error("genesis root mismatch: expected {}, computed {}", root_to_hex(.expected), root_to_hex(.computed))]
    GenesisMismatch {
        /// From the journal
        expected: RootHash,
        /// From replay
        computed: RootHash,
    },

    /// Entry applied with a different post-root.
    #[error("root mismatch at entry {sequence}")]
    RootMismatch {
        /// Entry
        sequence: u64,
        /// From the journal
        expected: RootHash,
        /// From replay
        computed: RootHash,
    },

    /// Entry was applied in one run and rejected in the other, or rejected with another code.
    #[error("outcome mismatch at entry {sequence}: expected {expected}, got {got}")]
    OutcomeMismatch {
        /// Entry
        sequence: u64,
        /// From the journal
        expected: String,
        /// From replay
        got: String,
    },

    /// Final root differs.
    #[error("final root mismatch: expected {}, computed {}", root_to_hex(.expected), root_to_hex(.computed))]
    FinalRootMismatch {
        /// From the journal
        expected: RootHash,
        /// From replay
        computed: RootHash,
    },
}

impl VerificationResult {
    fn failed(computed: RootHash, journal: &ActionJournal, checked: usize, error: VerificationError) -> Self {
        Self {
            valid: false,
            computed_final_root: computed,
            expected_final_root: journal.final_root,
            entries_checked: checked,
            error: Some(error),
        }
    }
}

/// Verify a journal by full replay.
///
/// Replay uses the given rules and authorizer; both must match the ones the
/// journal was produced with.
pub fn verify_journal<A: Authorizer>(
    genesis: &LeagueState,
    journal: &ActionJournal,
    rules: &LeagueRules,
    authorizer: A,
) -> VerificationResult {
    let mut machine = match LeagueMachine::new(genesis.clone(), rules.clone(), authorizer) {
        Ok(machine) => machine,
        Err(e) => return VerificationResult::failed([0; 32], journal, 0, e.into()),
    };

    let Some(expected_final) = journal.final_root else {
        return VerificationResult::failed(machine.root(), journal, 0, VerificationError::IncompleteJournal);
    };

    let genesis_root = machine.root();
    if genesis_root != journal.genesis_root {
        let error = VerificationError::GenesisMismatch {
            expected: journal.genesis_root,
            computed: genesis_root,
        };
        return VerificationResult::failed(genesis_root, journal, 0, error);
    }

    for (checked, entry) in journal.entries.iter().enumerate() {
        let replayed = match machine.apply(entry.action.clone()) {
            Ok(applied) => JournalOutcome::Applied { root: applied.root },
            Err(e) => JournalOutcome::Rejected { code: e.code().to_string() },
        };

        let error = match (&entry.outcome, &replayed) {
            (JournalOutcome::Applied { root: expected }, JournalOutcome::Applied { root: computed }) => {
                (expected != computed).then(|| VerificationError::RootMismatch {
                    sequence: entry.sequence,
                    expected: *expected,
                    computed: *computed,
                })
            }
            (expected, got) if expected != got => Some(VerificationError::OutcomeMismatch {
                sequence: entry.sequence,
                expected: expected.label(),
                got: got.label(),
            }),
            _ => None,
        };

        if let Some(error) = error {
            return VerificationResult::failed(machine.root(), journal, checked + 1, error);
        }
    }

    let computed = machine.root();
    let valid = computed == expected_final;
    VerificationResult {
        valid,
        computed_final_root: computed,
        expected_final_root: Some(expected_final),
        entries_checked: journal.entries.len(),
        error: if valid {
            None
        } else {
            Some(VerificationError::FinalRootMismatch {
                expected: expected_final,
                computed,
            })
        },
    }
}
