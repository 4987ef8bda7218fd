//! League Machine
//!
//! Owns one league's state and applies sequenced actions strictly one at a
//! time. Around each transition it enforces the sequencer contract (non-zero,
//! non-decreasing timestamps), consults the authorizer, keeps the incremental
//! commitment current and journals the outcome.

use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LeagueRules;
use crate::core::hash::{root_to_hex, RootHash};
use crate::league::action::SequencedAction;
use crate::league::error::LeagueError;
use crate::league::events::LeagueEvent;
use crate::league::genesis::{validate_genesis, GenesisError};
use crate::league::state::{LeagueState, Timestamp};
use crate::league::transition;
use crate::proof::commitment::{StateCommitment, SubRoots};
use crate::proof::journal::{ActionJournal, JournalOutcome};

// =============================================================================
// SEAMS
// =============================================================================

/// Decides whether a submitter may act on a league.
pub trait Authorizer {
    /// Whether `submitter` may submit actions against `state`.
    fn is_authorized(&self, state: &LeagueState, submitter: &str) -> bool;
}

/// Accept every submitter.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAccess;

impl Authorizer for OpenAccess {
    fn is_authorized(&self, _state: &LeagueState, _submitter: &str) -> bool {
        true
    }
}

/// Accept only submitters listed in `state.admins`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdminAllowList;

impl Authorizer for AdminAllowList {
    fn is_authorized(&self, state: &LeagueState, submitter: &str) -> bool {
        state.admins.iter().any(|admin| admin == submitter)
    }
}

impl<T: Authorizer + ?Sized> Authorizer for &T {
    fn is_authorized(&self, state: &LeagueState, submitter: &str) -> bool {
        (**self).is_authorized(state, submitter)
    }
}

impl<T: Authorizer + ?Sized> Authorizer for Box<T> {
    fn is_authorized(&self, state: &LeagueState, submitter: &str) -> bool {
        (**self).is_authorized(state, submitter)
    }
}

/// Supplies validated actions in sequencer order.
pub trait ActionSource {
    /// Next action, or `None` when drained.
    fn next_validated_action(&mut self) -> Option<SequencedAction>;
}

impl ActionSource for VecDeque<SequencedAction> {
    fn next_validated_action(&mut self) -> Option<SequencedAction> {
        self.pop_front()
    }
}

/// Adapts any iterator of actions into a source.
#[derive(Debug)]
pub struct IterSource<I>(I);

impl<I: Iterator<Item = SequencedAction>> ActionSource for IterSource<I> {
    fn next_validated_action(&mut self) -> Option<SequencedAction> {
        self.0.next()
    }
}

/// Wrap an iterator as an action source.
pub fn iter_source<I>(actions: I) -> IterSource<I::IntoIter>
where
    I: IntoIterator<Item = SequencedAction>,
{
    IterSource(actions.into_iter())
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why the machine refused an action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Submitter is not entitled to act.
    #[error("UNAUTHORIZED_FOR_ACTION: {submitter}")]
    Unauthorized {
        /// Rejected identity
        submitter: String,
    },

    /// The sequencer supplied no timestamp.
    #[error("ZERO_TIMESTAMP")]
    ZeroTimestamp,

    /// The sequencer went backwards.
    #[error("NON_MONOTONIC_TIMESTAMP: {got} is before {last}")]
    NonMonotonicTimestamp {
        /// Last accepted timestamp
        last: Timestamp,
        /// Offending timestamp
        got: Timestamp,
    },

    /// The transition handler rejected the action.
    #[error(transparent)]
    Rejected(#[from] LeagueError),
}

impl EngineError {
    /// Stable error code, as journaled.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Unauthorized { .. } => "UNAUTHORIZED_FOR_ACTION",
            EngineError::ZeroTimestamp => "ZERO_TIMESTAMP",
            EngineError::NonMonotonicTimestamp { .. } => "NON_MONOTONIC_TIMESTAMP",
            EngineError::Rejected(e) => e.code(),
        }
    }
}

// =============================================================================
// MACHINE
// =============================================================================

/// A successfully applied action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    /// Journal sequence number
    pub sequence: u64,
    /// Events produced
    pub events: Vec<LeagueEvent>,
    /// Root after the transition
    pub root: RootHash,
}

/// Counts from draining a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Actions applied
    pub applied: usize,
    /// Actions rejected
    pub rejected: usize,
}

/// One league's deterministic state machine.
pub struct LeagueMachine<A: Authorizer = OpenAccess> {
    state: LeagueState,
    rules: LeagueRules,
    authorizer: A,
    commitment: StateCommitment,
    journal: ActionJournal,
    last_timestamp: Option<Timestamp>,
}

impl LeagueMachine<OpenAccess> {
    /// Machine over a validated genesis with open access.
    pub fn open(genesis: LeagueState, rules: LeagueRules) -> Result<Self, GenesisError> {
        Self::new(genesis, rules, OpenAccess)
    }
}

impl<A: Authorizer> LeagueMachine<A> {
    /// Machine over a validated genesis.
    pub fn new(genesis: LeagueState, rules: LeagueRules, authorizer: A) -> Result<Self, GenesisError> {
        validate_genesis(&genesis)?;
        let commitment = StateCommitment::new(&genesis);
        let genesis_root = commitment.root();
        info!(
            teams = genesis.teams.len(),
            players = genesis.players.len(),
            root = %root_to_hex(&genesis_root),
            "League machine initialized"
        );
        Ok(Self {
            state: genesis,
            rules,
            authorizer,
            commitment,
            journal: ActionJournal::new(genesis_root),
            last_timestamp: None,
        })
    }

    /// Current state.
    pub fn state(&self) -> &LeagueState {
        &self.state
    }

    /// Rules in force.
    pub fn rules(&self) -> &LeagueRules {
        &self.rules
    }

    /// Current root hash.
    pub fn root(&self) -> RootHash {
        self.commitment.root()
    }

    /// Current sub-roots.
    pub fn sub_roots(&self) -> SubRoots {
        self.commitment.sub_roots()
    }

    /// Journal so far.
    pub fn journal(&self) -> &ActionJournal {
        &self.journal
    }

    /// Seal the journal with the current root and return it.
    pub fn into_journal(mut self) -> ActionJournal {
        let root = self.root();
        self.journal.finalize(root);
        self.journal
    }

    /// Apply one sequenced action. Every outcome is journaled.
    pub fn apply(&mut self, seq: SequencedAction) -> Result<AppliedTransition, EngineError> {
        match self.try_apply(&seq) {
            Ok(events) => {
                let root = self.root();
                let sequence = self.journal.record(seq, JournalOutcome::Applied { root });
                Ok(AppliedTransition { sequence, events, root })
            }
            Err(err) => {
                self.journal.record(
                    seq,
                    JournalOutcome::Rejected { code: err.code().to_string() },
                );
                Err(err)
            }
        }
    }

    fn try_apply(&mut self, seq: &SequencedAction) -> Result<Vec<LeagueEvent>, EngineError> {
        if seq.timestamp == 0 {
            return Err(EngineError::ZeroTimestamp);
        }
        if let Some(last) = self.last_timestamp {
            if seq.timestamp < last {
                return Err(EngineError::NonMonotonicTimestamp { last, got: seq.timestamp });
            }
        }
        self.last_timestamp = Some(seq.timestamp);

        if !self.authorizer.is_authorized(&self.state, &seq.submitter) {
            warn!(submitter = %seq.submitter, action = seq.action.name(), "Unauthorized action");
            return Err(EngineError::Unauthorized { submitter: seq.submitter.clone() });
        }

        let result = transition::apply(&mut self.state, &seq.action, seq.timestamp, &self.rules)?;
        self.commitment.update(&self.state, &result.events);

        #[cfg(feature = "debug-tracing")]
        debug_assert_eq!(
            self.commitment.root(),
            crate::proof::commitment::compute_root(&self.state),
            "incremental root diverged"
        );

        Ok(result.events)
    }

    /// Drain a source, applying each action in order. Rejections are
    /// journaled and skipped.
    pub fn run<S: ActionSource + ?Sized>(&mut self, source: &mut S) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(seq) = source.next_validated_action() {
            match self.apply(seq) {
                Ok(_) => summary.applied += 1,
                Err(err) => {
                    debug!(code = err.code(), "Action skipped");
                    summary.rejected += 1;
                }
            }
        }
        debug!(applied = summary.applied, rejected = summary.rejected, "Source drained");
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::action::Action;
    use crate::league::genesis::GenesisBuilder;
    use crate::proof::commitment::compute_root;

    fn machine() -> LeagueMachine {
        LeagueMachine::open(GenesisBuilder::numbered(4, 2).build().unwrap(), LeagueRules::default()).unwrap()
    }

    #[test]
    fn test_applied_root_matches_full_recompute() {
        let mut m = machine();
        let applied = m.apply(SequencedAction::new(Action::StartTournament, "ops", 10)).unwrap();
        assert_eq!(applied.sequence, 0);
        assert_eq!(applied.root, compute_root(m.state()));
        assert_eq!(m.state().meta.round, 1);
    }

    #[test]
    fn test_timestamp_contract() {
        let mut m = machine();
        let root = m.root();

        assert_eq!(
            m.apply(SequencedAction::new(Action::StartTournament, "ops", 0)),
            Err(EngineError::ZeroTimestamp)
        );
        m.apply(SequencedAction::new(Action::StartTournament, "ops", 50)).unwrap();
        let after_start = m.root();
        assert_ne!(root, after_start);

        assert_eq!(
            m.apply(SequencedAction::new(Action::start_match(1), "ops", 49)),
            Err(EngineError::NonMonotonicTimestamp { last: 50, got: 49 })
        );
        assert_eq!(m.root(), after_start);

        // Equal timestamps are fine.
        m.apply(SequencedAction::new(Action::start_match(1), "ops", 50)).unwrap();
    }

    #[test]
    fn test_admin_allow_list() {
        let genesis = GenesisBuilder::numbered(2, 1).admin("ops").build().unwrap();
        let mut m = LeagueMachine::new(genesis, LeagueRules::default(), AdminAllowList).unwrap();
        let root = m.root();

        let err = m.apply(SequencedAction::new(Action::StartTournament, "mallory", 1)).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED_FOR_ACTION");
        assert_eq!(m.root(), root);
        assert_eq!(m.state().meta.round, 0);

        m.apply(SequencedAction::new(Action::StartTournament, "ops", 2)).unwrap();
        assert_eq!(m.state().meta.round, 1);
    }

    #[test]
    fn test_run_records_everything() {
        let mut m = machine();
        let mut source: VecDeque<SequencedAction> = [
            SequencedAction::new(Action::StartTournament, "ops", 1),
            SequencedAction::new(Action::bye(1), "ops", 2),
            SequencedAction::new(Action::start_match(1), "ops", 3),
            SequencedAction::new(Action::goal(1, 1), "ops", 4),
        ]
        .into_iter()
        .collect();

        let summary = m.run(&mut source);
        assert_eq!(summary, RunSummary { applied: 3, rejected: 1 });
        assert!(source.is_empty());

        let journal = m.into_journal();
        assert_eq!(journal.entries.len(), 4);
        assert_eq!(
            journal.entries[1].outcome,
            JournalOutcome::Rejected { code: "BYE_NOT_REQUIRED_IN_THIS_ROUND".into() }
        );
        assert!(journal.is_complete());
    }

    #[test]
    fn test_iter_source_and_rejected_error_conversion() {
        let mut m = machine();
        let mut source = iter_source(vec![SequencedAction::new(Action::start_match(1), "ops", 1)]);
        assert_eq!(m.run(&mut source), RunSummary { applied: 0, rejected: 1 });

        let err = m.apply(SequencedAction::new(Action::end_match(4), "ops", 2)).unwrap_err();
        assert_eq!(err, EngineError::Rejected(LeagueError::MatchNotFound(crate::league::state::MatchId(4))));
    }

    #[test]
    fn test_invalid_genesis_rejected() {
        let genesis = LeagueState::default();
        assert!(matches!(
            LeagueMachine::open(genesis, LeagueRules::default()),
            Err(GenesisError::TooFewTeams(0))
        ));
    }
}
