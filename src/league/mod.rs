//! League Logic Module
//!
//! The tournament state machine. 100% deterministic: time comes from the
//! sequencer and every collection iterates in a fixed order.
//!
//! ## Module Structure
//!
//! - `state`: Teams, players, matches, logs, tournament metadata
//! - `genesis`: Initial state loading and integrity checks
//! - `action`: Action sum type and sequencer envelope
//! - `transition`: One handler per action
//! - `bracket`: Leaderboard and round generation
//! - `query`: Read-only views
//! - `machine`: Sequential driver with authorization and commitment
//! - `events`, `error`: Transition outputs

pub mod state;
pub mod genesis;
pub mod action;
pub mod error;
pub mod events;
pub mod bracket;
pub mod transition;
pub mod query;
pub mod machine;

// Re-export key types
pub use state::{
    Bye, LeagueState, LogAction, LogEntry, Match, MatchId, MatchPhase, Player, PlayerId, Team,
    TeamId, Timestamp, TournamentMeta,
};
pub use genesis::{from_genesis_json, validate_genesis, GenesisBuilder, GenesisError};
pub use action::{Action, SequencedAction};
pub use error::{ErrorKind, LeagueError, LeagueResult};
pub use events::LeagueEvent;
pub use bracket::{compute_leaderboard, plan_next_round, LeaderboardEntry, RoundPlan};
pub use transition::{apply, TransitionResult};
pub use machine::{
    ActionSource, AdminAllowList, AppliedTransition, Authorizer, EngineError, LeagueMachine,
    OpenAccess, RunSummary, iter_source,
};
