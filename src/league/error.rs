//! Transition and Query Errors
//!
//! Every failure is local to one transition and leaves state untouched.
//! Each variant carries a stable upper-snake code that survives into journals.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::league::state::{MatchId, PlayerId, TeamId};

/// Coarse classification of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A referenced entity does not exist.
    NotFound,
    /// The entity exists but is in the wrong lifecycle phase.
    InvalidStateTransition,
    /// A player does not belong to a contesting team.
    InvalidTeam,
    /// The state lacks what the transition needs (goals to remove, a decisive score).
    InsufficientState,
}

/// Errors produced by transition handlers and query helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeagueError {
    /// Match id unknown.
    #[error("MATCH_NOT_FOUND: match {0}")]
    MatchNotFound(MatchId),

    /// Player id unknown.
    #[error("PLAYER_NOT_FOUND: player {0}")]
    PlayerNotFound(PlayerId),

    /// Team id unknown.
    #[error("TEAM_NOT_FOUND: team {0}")]
    TeamNotFound(TeamId),

    /// Tournament already has rounds or a start time.
    #[error("TOURNAMENT_ALREADY_STARTED")]
    TournamentAlreadyStarted,

    /// Start requested after a champion was declared.
    #[error("TOURNAMENT_ALREADY_ENDED")]
    TournamentAlreadyEnded,

    /// Any match action after a champion was declared.
    #[error("TOURNAMENT_ENDED")]
    TournamentEnded,

    /// Match already kicked off.
    #[error("MATCH_ALREADY_STARTED: match {0}")]
    MatchAlreadyStarted(MatchId),

    /// Match has not kicked off.
    #[error("MATCH_NOT_STARTED: match {0}")]
    MatchNotStarted(MatchId),

    /// Logging into a finished match.
    #[error("MATCH_ENDED: match {0}")]
    MatchEnded(MatchId),

    /// Ending a finished match.
    #[error("MATCH_ALREADY_ENDED: match {0}")]
    MatchAlreadyEnded(MatchId),

    /// Shootout already running.
    #[error("SHOOTOUT_ALREADY_STARTED: match {0}")]
    ShootoutAlreadyStarted(MatchId),

    /// Shootout requested with regulation scores not level.
    #[error("SCORES_NOT_EQUAL: match {0}")]
    ScoresNotEqual(MatchId),

    /// Penalty logged without a shootout.
    #[error("PENALTY_NOT_STARTED: match {0}")]
    PenaltyNotStarted(MatchId),

    /// Player is not on the team the action named.
    #[error("INVALID_TEAM: player {player_id} is not on team {expected}")]
    InvalidTeam {
        /// Offending player
        player_id: PlayerId,
        /// Team the action required
        expected: TeamId,
    },

    /// Player is on neither contesting team.
    #[error("INVALID_TEAM: player {player_id} is not on team {home} or {away} in match {match_id}")]
    PlayerNotInMatch {
        /// Offending player
        player_id: PlayerId,
        /// Match
        match_id: MatchId,
        /// Lower contesting team id
        home: TeamId,
        /// Higher contesting team id
        away: TeamId,
    },

    /// Player was soft-deleted.
    #[error("PLAYER_REMOVED: player {0}")]
    PlayerRemoved(PlayerId),

    /// Player already soft-deleted.
    #[error("PLAYER_ALREADY_REMOVED: player {0}")]
    PlayerAlreadyRemoved(PlayerId),

    /// No goal to correct for this player in this match.
    #[error("NO_GOALS_TO_REMOVE: player {player_id} in match {match_id}")]
    NoGoalsToRemove {
        /// Match
        match_id: MatchId,
        /// Player
        player_id: PlayerId,
    },

    /// Decisive scores are level.
    #[error("MATCH_NOT_CONCLUDED: match {0} has level decisive scores")]
    MatchNotConcluded(MatchId),

    /// A bye was requested when the round plan is not blocked on a tie.
    #[error("BYE_NOT_REQUIRED_IN_THIS_ROUND")]
    ByeNotRequired,

    /// The team cannot take the bye.
    #[error("TEAM_NOT_ELIGIBLE_FOR_BYE: team {0}")]
    TeamNotEligibleForBye(TeamId),

    /// Transitions need a sequencer time; `0` means unset.
    #[error("ZERO_TIMESTAMP")]
    ZeroTimestamp,
}

impl LeagueError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MatchNotFound(_) => "MATCH_NOT_FOUND",
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::TeamNotFound(_) => "TEAM_NOT_FOUND",
            Self::TournamentAlreadyStarted => "TOURNAMENT_ALREADY_STARTED",
            Self::TournamentAlreadyEnded => "TOURNAMENT_ALREADY_ENDED",
            Self::TournamentEnded => "TOURNAMENT_ENDED",
            Self::MatchAlreadyStarted(_) => "MATCH_ALREADY_STARTED",
            Self::MatchNotStarted(_) => "MATCH_NOT_STARTED",
            Self::MatchEnded(_) => "MATCH_ENDED",
            Self::MatchAlreadyEnded(_) => "MATCH_ALREADY_ENDED",
            Self::ShootoutAlreadyStarted(_) => "SHOOTOUT_ALREADY_STARTED",
            Self::ScoresNotEqual(_) => "SCORES_NOT_EQUAL",
            Self::PenaltyNotStarted(_) => "PENALTY_NOT_STARTED",
            Self::InvalidTeam { .. } | Self::PlayerNotInMatch { .. } => "INVALID_TEAM",
            Self::PlayerRemoved(_) => "PLAYER_REMOVED",
            Self::PlayerAlreadyRemoved(_) => "PLAYER_ALREADY_REMOVED",
            Self::NoGoalsToRemove { .. } => "NO_GOALS_TO_REMOVE",
            Self::MatchNotConcluded(_) => "MATCH_NOT_CONCLUDED",
            Self::ByeNotRequired => "BYE_NOT_REQUIRED_IN_THIS_ROUND",
            Self::TeamNotEligibleForBye(_) => "TEAM_NOT_ELIGIBLE_FOR_BYE",
            Self::ZeroTimestamp => "ZERO_TIMESTAMP",
        }
    }

    /// Taxonomy bucket.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MatchNotFound(_) | Self::PlayerNotFound(_) | Self::TeamNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidTeam { .. } | Self::PlayerNotInMatch { .. } => ErrorKind::InvalidTeam,
            Self::NoGoalsToRemove { .. }
            | Self::MatchNotConcluded(_)
            | Self::ScoresNotEqual(_)
            | Self::ByeNotRequired
            | Self::TeamNotEligibleForBye(_) => ErrorKind::InsufficientState,
            _ => ErrorKind::InvalidStateTransition,
        }
    }
}

/// Result alias for league operations.
pub type LeagueResult<T> = Result<T, LeagueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_code() {
        let errors = [
            LeagueError::MatchNotFound(MatchId(4)),
            LeagueError::NoGoalsToRemove { match_id: MatchId(1), player_id: PlayerId(2) },
            LeagueError::ByeNotRequired,
            LeagueError::InvalidTeam { player_id: PlayerId(1), expected: TeamId(2) },
            LeagueError::PlayerNotInMatch {
                player_id: PlayerId(5),
                match_id: MatchId(1),
                home: TeamId(1),
                away: TeamId(2),
            },
            LeagueError::ZeroTimestamp,
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()), "{}", err);
        }
    }

    #[test]
    fn test_kind_taxonomy() {
        assert_eq!(LeagueError::TeamNotFound(TeamId(1)).kind(), ErrorKind::NotFound);
        assert_eq!(LeagueError::MatchEnded(MatchId(1)).kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(LeagueError::TournamentEnded.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(
            LeagueError::InvalidTeam { player_id: PlayerId(1), expected: TeamId(1) }.kind(),
            ErrorKind::InvalidTeam
        );
        assert_eq!(LeagueError::MatchNotConcluded(MatchId(1)).kind(), ErrorKind::InsufficientState);
        assert_eq!(LeagueError::ZeroTimestamp.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_not_in_match_names_both_teams() {
        let err = LeagueError::PlayerNotInMatch {
            player_id: PlayerId(5),
            match_id: MatchId(1),
            home: TeamId(1),
            away: TeamId(2),
        };
        assert_eq!(err.code(), "INVALID_TEAM");
        assert_eq!(err.kind(), ErrorKind::InvalidTeam);
        assert_eq!(err.to_string(), "INVALID_TEAM: player 5 is not on team 1 or 2 in match 1");
    }
}
