//! League Events
//!
//! Events emitted by successful transitions, for logging, journaling and
//! incremental commitment updates.

use serde::{Serialize, Deserialize};

use crate::league::state::{LogAction, MatchId, PlayerId, TeamId, Timestamp};

/// Something that happened as part of one transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueEvent {
    /// Tournament start time recorded
    TournamentStarted {
        /// Start time
        at: Timestamp,
    },

    /// A new round's fixtures were generated
    RoundScheduled {
        /// New round number
        round: u32,
        /// Created matches, in pairing order
        match_ids: Vec<MatchId>,
        /// Team left out of this round's pairing, if the odd-count rule dropped one
        held_out: Option<TeamId>,
    },

    /// Fixture generation is blocked on a leaderboard tie until a bye is granted
    RoundDeferred {
        /// Round that just completed
        round: u32,
    },

    /// A bye was recorded
    ByeGranted {
        /// Team
        team_id: TeamId,
        /// Round the bye belongs to
        round: u32,
    },

    /// One team remains
    TournamentEnded {
        /// Champion
        winner: TeamId,
        /// End time
        at: Timestamp,
    },

    /// Match kicked off
    MatchStarted {
        /// Match
        match_id: MatchId,
    },

    /// Penalty shootout started
    ShootoutStarted {
        /// Match
        match_id: MatchId,
    },

    /// A regulation score moved (goal or goal correction)
    ScoreChanged {
        /// Match
        match_id: MatchId,
        /// Team whose score changed
        team_id: TeamId,
        /// New regulation score
        score: u32,
    },

    /// A log entry was appended
    ActionLogged {
        /// Match
        match_id: MatchId,
        /// Player
        player_id: PlayerId,
        /// Logged action
        action: LogAction,
    },

    /// Final whistle
    MatchEnded {
        /// Match
        match_id: MatchId,
        /// Winner
        winner: TeamId,
        /// Decisive scores (regulation plus penalty hits) in ascending team order
        decisive: [(TeamId, u32); 2],
    },

    /// Roster addition
    PlayerAdded {
        /// New player
        player_id: PlayerId,
        /// Team
        team_id: TeamId,
    },

    /// Roster soft delete
    PlayerRemoved {
        /// Player
        player_id: PlayerId,
    },
}

impl LeagueEvent {
    /// Existing match record this event mutated in place, if any.
    ///
    /// Newly scheduled matches are not reported here; they are appends.
    pub fn mutated_match(&self) -> Option<MatchId> {
        match self {
            LeagueEvent::MatchStarted { match_id }
            | LeagueEvent::ShootoutStarted { match_id }
            | LeagueEvent::ScoreChanged { match_id, .. }
            | LeagueEvent::MatchEnded { match_id, .. } => Some(*match_id),
            _ => None,
        }
    }

    /// Whether this event changes round progression.
    pub fn is_bracket_event(&self) -> bool {
        matches!(
            self,
            LeagueEvent::RoundScheduled { .. }
                | LeagueEvent::RoundDeferred { .. }
                | LeagueEvent::ByeGranted { .. }
                | LeagueEvent::TournamentEnded { .. }
        )
    }
}
