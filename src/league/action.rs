//! League Actions
//!
//! One variant per transition kind, each carrying only the fields its handler
//! reads. Shape validation happens at deserialization; handlers never check
//! for optional fields.

use serde::{Serialize, Deserialize};

use crate::league::state::{MatchId, PlayerId, TeamId, Timestamp};

// =============================================================================
// PAYLOADS
// =============================================================================

/// Reference to a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRef {
    /// Match
    pub match_id: MatchId,
}

/// A player acting within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPlayerRef {
    /// Match
    pub match_id: MatchId,
    /// Acting player
    pub player_id: PlayerId,
}

/// Reference to a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    /// Team
    pub team_id: TeamId,
}

/// Roster addition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    /// Team to join
    pub team_id: TeamId,
    /// Display name
    pub player_name: String,
}

/// A player on a specific team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    /// Team the caller believes the player is on
    pub team_id: TeamId,
    /// Player
    pub player_id: PlayerId,
}

// =============================================================================
// ACTION
// =============================================================================

/// A validated action ready for dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Generate round-one fixtures and record the start time.
    StartTournament,
    /// Kick off a match.
    StartMatch(MatchRef),
    /// Begin a penalty shootout.
    #[serde(alias = "penaltyShootout")]
    StartPenaltyShootout(MatchRef),
    /// Regulation goal.
    LogGoal(MatchPlayerRef),
    /// Correct a wrongly awarded goal.
    RemoveGoal(MatchPlayerRef),
    /// Block / save.
    LogBlock(MatchPlayerRef),
    /// Foul.
    LogFoul(MatchPlayerRef),
    /// Scored shootout penalty.
    LogPenaltyHit(MatchPlayerRef),
    /// Missed shootout penalty.
    LogPenaltyMiss(MatchPlayerRef),
    /// Final whistle.
    EndMatch(MatchRef),
    /// Add a player to a roster.
    AddPlayer(NewPlayer),
    /// Soft-delete a player.
    RemovePlayer(PlayerRef),
    /// Grant a bye to break a leaderboard tie.
    LogByes(TeamRef),
}

impl Action {
    /// Stable action name.
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartTournament => "startTournament",
            Action::StartMatch(_) => "startMatch",
            Action::StartPenaltyShootout(_) => "startPenaltyShootout",
            Action::LogGoal(_) => "logGoal",
            Action::RemoveGoal(_) => "removeGoal",
            Action::LogBlock(_) => "logBlock",
            Action::LogFoul(_) => "logFoul",
            Action::LogPenaltyHit(_) => "logPenaltyHit",
            Action::LogPenaltyMiss(_) => "logPenaltyMiss",
            Action::EndMatch(_) => "endMatch",
            Action::AddPlayer(_) => "addPlayer",
            Action::RemovePlayer(_) => "removePlayer",
            Action::LogByes(_) => "logByes",
        }
    }

    /// Match the action targets, if any.
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Action::StartMatch(r) | Action::StartPenaltyShootout(r) | Action::EndMatch(r) => {
                Some(r.match_id)
            }
            Action::LogGoal(r)
            | Action::RemoveGoal(r)
            | Action::LogBlock(r)
            | Action::LogFoul(r)
            | Action::LogPenaltyHit(r)
            | Action::LogPenaltyMiss(r) => Some(r.match_id),
            _ => None,
        }
    }

    // Convenience constructors used by drivers and tests.

    /// `startMatch` for a match id.
    pub fn start_match(match_id: u64) -> Self {
        Action::StartMatch(MatchRef { match_id: MatchId(match_id) })
    }

    /// `startPenaltyShootout` for a match id.
    pub fn start_shootout(match_id: u64) -> Self {
        Action::StartPenaltyShootout(MatchRef { match_id: MatchId(match_id) })
    }

    /// `endMatch` for a match id.
    pub fn end_match(match_id: u64) -> Self {
        Action::EndMatch(MatchRef { match_id: MatchId(match_id) })
    }

    /// `logGoal` for a match and player.
    pub fn goal(match_id: u64, player_id: u64) -> Self {
        Action::LogGoal(MatchPlayerRef { match_id: MatchId(match_id), player_id: PlayerId(player_id) })
    }

    /// `removeGoal` for a match and player.
    pub fn remove_goal(match_id: u64, player_id: u64) -> Self {
        Action::RemoveGoal(MatchPlayerRef { match_id: MatchId(match_id), player_id: PlayerId(player_id) })
    }

    /// `logPenaltyHit` for a match and player.
    pub fn penalty_hit(match_id: u64, player_id: u64) -> Self {
        Action::LogPenaltyHit(MatchPlayerRef { match_id: MatchId(match_id), player_id: PlayerId(player_id) })
    }

    /// `logPenaltyMiss` for a match and player.
    pub fn penalty_miss(match_id: u64, player_id: u64) -> Self {
        Action::LogPenaltyMiss(MatchPlayerRef { match_id: MatchId(match_id), player_id: PlayerId(player_id) })
    }

    /// `logByes` for a team.
    pub fn bye(team_id: u64) -> Self {
        Action::LogByes(TeamRef { team_id: TeamId(team_id) })
    }
}

/// An action as handed over by the sequencer.
///
/// The sequencer has already checked signatures and shape; the machine only
/// checks authorization and timestamp ordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencedAction {
    /// What to do
    pub action: Action,
    /// Verified submitter identity
    pub submitter: String,
    /// Sequencer-assigned time, non-decreasing
    pub timestamp: Timestamp,
}

impl SequencedAction {
    /// Create a sequenced action.
    pub fn new(action: Action, submitter: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            action,
            submitter: submitter.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_json_shape() {
        let action: Action = serde_json::from_str(r#"{"logGoal": {"matchId": 3, "playerId": 7}}"#).unwrap();
        assert_eq!(action, Action::goal(3, 7));
        assert_eq!(action.name(), "logGoal");
        assert_eq!(action.match_id(), Some(MatchId(3)));

        let start: Action = serde_json::from_str(r#""startTournament""#).unwrap();
        assert_eq!(start, Action::StartTournament);
        assert_eq!(start.match_id(), None);

        let add: Action =
            serde_json::from_str(r#"{"addPlayer": {"teamId": 2, "playerName": "Cleo"}}"#).unwrap();
        assert!(matches!(add, Action::AddPlayer(NewPlayer { team_id: TeamId(2), .. })));
    }

    #[test]
    fn test_shootout_alias() {
        let action: Action = serde_json::from_str(r#"{"penaltyShootout": {"matchId": 1}}"#).unwrap();
        assert_eq!(action, Action::start_shootout(1));
        assert_eq!(serde_json::to_string(&action).unwrap(), r#"{"startPenaltyShootout":{"matchId":1}}"#);
    }

    #[test]
    fn test_unknown_action_rejected() {
        assert!(serde_json::from_str::<Action>(r#"{"renameTeam": {"teamId": 1}}"#).is_err());
        assert!(serde_json::from_str::<Action>(r#"{"logGoal": {"matchId": 1}}"#).is_err());
    }

    #[test]
    fn test_sequenced_action_bincode() {
        let seq = SequencedAction::new(Action::bye(4), "admin", 1_700_000_000_000);
        let bytes = bincode::serialize(&seq).unwrap();
        let back: SequencedAction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, seq);
    }
}
