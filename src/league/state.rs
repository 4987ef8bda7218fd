//! League State Definitions
//!
//! All record types for the tournament ledger.
//! Collections are plain vectors whose order is part of the state: teams and
//! players keep genesis/insertion order, matches and logs are append-only.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};

use crate::core::codec::{CanonicalEncode, CanonicalEncoder};

/// Sequencer-supplied timestamp (milliseconds since epoch, never read locally).
pub type Timestamp = u64;

/// Documents write unset times and winners as `0`; read them as `None`.
fn zero_as_unset<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.filter(|&value| value != 0))
}

fn zero_as_no_team<'de, D>(deserializer: D) -> Result<Option<TeamId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(zero_as_unset(deserializer)?.map(TeamId))
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Raw integer value.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Stable team identifier, fixed at genesis.
    TeamId
);
define_id!(
    /// Player identifier, assigned monotonically.
    PlayerId
);
define_id!(
    /// Sequential match identifier (`matches.len() + 1` at creation).
    MatchId
);

// =============================================================================
// TEAM & PLAYER
// =============================================================================

/// A team. Immutable after genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique team ID
    pub id: TeamId,
    /// Display name
    pub name: String,
}

impl CanonicalEncode for Team {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.id.0);
        enc.put_str(&self.name);
    }
}

/// A player on a team roster.
///
/// Players are never physically removed; `removed_at` marks a soft delete so
/// that historical logs keep resolving.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Team the player belongs to
    pub team_id: TeamId,
    /// Timestamp of soft deletion
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "zero_as_unset")]
    pub removed_at: Option<Timestamp>,
}

impl Player {
    /// Whether the player is still on the roster.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }
}

impl CanonicalEncode for Player {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.id.0);
        enc.put_str(&self.name);
        enc.put_u64(self.team_id.0);
        enc.put_opt_u64(self.removed_at);
    }
}

// =============================================================================
// MATCH
// =============================================================================

/// Lifecycle phase of a match, derived from its time fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Fixture created, not kicked off
    Unscheduled,
    /// In regulation play
    Started,
    /// Regulation ended level, penalties in progress
    PenaltyShootout,
    /// Terminal
    Ended,
}

/// A fixture between exactly two teams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Match ID
    pub id: MatchId,
    /// Regulation goals per team. Always exactly two entries.
    pub scores: BTreeMap<TeamId, u32>,
    /// Kick-off time
    #[serde(default, deserialize_with = "zero_as_unset")]
    pub start_time: Option<Timestamp>,
    /// Final whistle time
    #[serde(default, deserialize_with = "zero_as_unset")]
    pub end_time: Option<Timestamp>,
    /// Shootout start time
    #[serde(default, deserialize_with = "zero_as_unset")]
    pub penalty_start_time: Option<Timestamp>,
    /// Winner, set together with `end_time`
    #[serde(default, deserialize_with = "zero_as_no_team")]
    pub winner_team_id: Option<TeamId>,
}

impl Match {
    /// Create a fresh fixture with zero scores and no times set.
    pub fn fixture(id: MatchId, home: TeamId, away: TeamId) -> Self {
        let mut scores = BTreeMap::new();
        scores.insert(home, 0);
        scores.insert(away, 0);
        Self {
            id,
            scores,
            start_time: None,
            end_time: None,
            penalty_start_time: None,
            winner_team_id: None,
        }
    }

    /// The two contesting teams in ascending id order.
    pub fn team_ids(&self) -> Vec<TeamId> {
        self.scores.keys().copied().collect()
    }

    /// Both contesting teams, ascending. A missing slot reads as team 0.
    pub fn contestants(&self) -> [TeamId; 2] {
        let mut ids = self.scores.keys().copied();
        [ids.next().unwrap_or_default(), ids.next().unwrap_or_default()]
    }

    /// Whether the given team plays in this match.
    #[inline]
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.scores.contains_key(&team_id)
    }

    /// Current regulation score for a team.
    pub fn score_of(&self, team_id: TeamId) -> Option<u32> {
        self.scores.get(&team_id).copied()
    }

    /// Whether the match has kicked off.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Whether the match is terminal.
    #[inline]
    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// Started and not ended.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.is_started() && !self.is_ended()
    }

    /// Derive the lifecycle phase.
    pub fn phase(&self) -> MatchPhase {
        if self.is_ended() {
            MatchPhase::Ended
        } else if self.penalty_start_time.is_some() {
            MatchPhase::PenaltyShootout
        } else if self.is_started() {
            MatchPhase::Started
        } else {
            MatchPhase::Unscheduled
        }
    }
}

impl CanonicalEncode for Match {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.id.0);
        // Two slots regardless of map contents, ascending team id.
        let mut entries = self.scores.iter();
        for _ in 0..2 {
            let (team, score) = entries.next().map(|(t, s)| (t.0, *s)).unwrap_or((0, 0));
            enc.put_u64(team);
            enc.put_u32(score);
        }
        enc.put_opt_u64(self.start_time);
        enc.put_opt_u64(self.end_time);
        enc.put_opt_u64(self.penalty_start_time);
        enc.put_opt_u64(self.winner_team_id.map(TeamId::get));
    }
}

// =============================================================================
// LOGS
// =============================================================================

/// Kind of an append-only log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogAction {
    /// Goal in regulation
    Goal,
    /// Compensating entry for a wrongly awarded goal
    DeletedGoal,
    /// Save / block
    Block,
    /// Scored shootout penalty
    PenaltyHit,
    /// Missed shootout penalty
    PenaltyMiss,
    /// Foul
    Foul,
}

impl LogAction {
    /// Stable wire name, also used in the canonical encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            LogAction::Goal => "GOAL",
            LogAction::DeletedGoal => "DELETED_GOAL",
            LogAction::Block => "BLOCK",
            LogAction::PenaltyHit => "PENALTY_HIT",
            LogAction::PenaltyMiss => "PENALTY_MISS",
            LogAction::Foul => "FOUL",
        }
    }

    /// Whether this action belongs to a penalty shootout.
    pub fn is_penalty(self) -> bool {
        matches!(self, LogAction::PenaltyHit | LogAction::PenaltyMiss)
    }
}

impl fmt::Display for LogAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only log record. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Acting player
    pub player_id: PlayerId,
    /// Match the action happened in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    /// Sequencer timestamp of the transition that appended it
    pub timestamp: Timestamp,
    /// What happened
    pub action: LogAction,
}

impl CanonicalEncode for LogEntry {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u64(self.player_id.0);
        enc.put_u64(self.timestamp);
        enc.put_str(self.action.as_str());
        enc.put_opt_u64(self.match_id.map(MatchId::get));
    }
}

// =============================================================================
// TOURNAMENT META
// =============================================================================

/// A bye granted to a team in a given round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bye {
    /// Team given the bye
    pub team_id: TeamId,
    /// Round in which the bye was granted
    pub round: u32,
}

/// Tournament-wide progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentMeta {
    /// 0 = not started
    pub round: u32,
    /// Set once by start-tournament
    #[serde(default, deserialize_with = "zero_as_unset")]
    pub start_time: Option<Timestamp>,
    /// Set once when a single team remains
    #[serde(default, deserialize_with = "zero_as_unset")]
    pub end_time: Option<Timestamp>,
    /// Champion, set together with `end_time`
    #[serde(default, deserialize_with = "zero_as_no_team")]
    pub winner_team_id: Option<TeamId>,
    /// Byes in grant order
    #[serde(default)]
    pub byes: Vec<Bye>,
}

impl TournamentMeta {
    /// Whether a champion has been declared.
    #[inline]
    pub fn has_ended(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether a bye was granted in the current round.
    pub fn has_bye_this_round(&self) -> bool {
        self.byes.iter().any(|b| b.round == self.round)
    }

    /// Number of byes ever granted to a team.
    pub fn byes_for(&self, team_id: TeamId) -> u32 {
        self.byes.iter().filter(|b| b.team_id == team_id).count() as u32
    }
}

impl CanonicalEncode for TournamentMeta {
    fn encode_canonical(&self, enc: &mut CanonicalEncoder) {
        enc.put_u32(self.round);
        enc.put_opt_u64(self.start_time);
        enc.put_opt_u64(self.end_time);
        enc.put_opt_u64(self.winner_team_id.map(TeamId::get));
        enc.put_u32(self.byes.len() as u32);
        for bye in &self.byes {
            enc.put_u64(bye.team_id.0);
            enc.put_u32(bye.round);
        }
    }
}

// =============================================================================
// LEAGUE STATE
// =============================================================================

/// The entire mutable universe of one league.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueState {
    /// Submitters allowed to act when admin enforcement is on
    #[serde(default)]
    pub admins: Vec<String>,
    /// Tournament progress
    #[serde(default)]
    pub meta: TournamentMeta,
    /// Teams (genesis order)
    pub teams: Vec<Team>,
    /// Players (insertion order)
    #[serde(default)]
    pub players: Vec<Player>,
    /// Matches (append-only, id = index + 1)
    #[serde(default)]
    pub matches: Vec<Match>,
    /// Logs (append-only)
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl LeagueState {
    /// Get a team by ID.
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Get a player by ID.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a player mutably by ID.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Get a match by ID.
    pub fn get_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Get a match mutably by ID.
    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Whether every existing match has ended (vacuously true with none).
    pub fn all_matches_complete(&self) -> bool {
        self.matches.iter().all(Match::is_ended)
    }

    /// Whether the tournament has a champion.
    pub fn has_tournament_ended(&self) -> bool {
        self.meta.has_ended()
    }

    /// Player id to team id, including soft-deleted players.
    pub fn player_teams(&self) -> BTreeMap<PlayerId, TeamId> {
        self.players.iter().map(|p| (p.id, p.team_id)).collect()
    }

    /// Next player id: one past the largest id seen in the roster, the roster
    /// size, or any log entry.
    pub fn next_player_id(&self) -> PlayerId {
        let max_roster = self.players.iter().map(|p| p.id.0).max().unwrap_or(0);
        let max_logged = self.logs.iter().map(|l| l.player_id.0).max().unwrap_or(0);
        let base = max_roster.max(self.players.len() as u64).max(max_logged);
        PlayerId(base + 1)
    }

    /// Next match id.
    pub fn next_match_id(&self) -> MatchId {
        MatchId(self.matches.len() as u64 + 1)
    }

    /// Net goals (GOAL minus DELETED_GOAL) a player has in a match.
    pub fn net_goals(&self, match_id: MatchId, player_id: PlayerId) -> i64 {
        self.logs
            .iter()
            .filter(|l| l.match_id == Some(match_id) && l.player_id == player_id)
            .fold(0i64, |acc, l| match l.action {
                LogAction::Goal => acc + 1,
                LogAction::DeletedGoal => acc - 1,
                _ => acc,
            })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> LeagueState {
        LeagueState {
            teams: vec![
                Team { id: TeamId(1), name: "Lions".into() },
                Team { id: TeamId(2), name: "Tigers".into() },
            ],
            players: vec![
                Player { id: PlayerId(1), name: "Ana".into(), team_id: TeamId(1), removed_at: None },
                Player { id: PlayerId(2), name: "Ben".into(), team_id: TeamId(2), removed_at: None },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_match_phase_progression() {
        let mut m = Match::fixture(MatchId(1), TeamId(2), TeamId(1));
        assert_eq!(m.phase(), MatchPhase::Unscheduled);
        assert_eq!(m.team_ids(), vec![TeamId(1), TeamId(2)]);
        assert_eq!(m.contestants(), [TeamId(1), TeamId(2)]);

        m.start_time = Some(10);
        assert_eq!(m.phase(), MatchPhase::Started);
        assert!(m.is_live());

        m.penalty_start_time = Some(20);
        assert_eq!(m.phase(), MatchPhase::PenaltyShootout);

        m.end_time = Some(30);
        assert_eq!(m.phase(), MatchPhase::Ended);
        assert!(!m.is_live());
    }

    #[test]
    fn test_next_player_id_covers_logs() {
        let mut state = sample_state();
        assert_eq!(state.next_player_id(), PlayerId(3));

        state.logs.push(LogEntry {
            player_id: PlayerId(9),
            match_id: None,
            timestamp: 1,
            action: LogAction::Foul,
        });
        assert_eq!(state.next_player_id(), PlayerId(10));
    }

    #[test]
    fn test_net_goals_counts_corrections() {
        let mut state = sample_state();
        for action in [LogAction::Goal, LogAction::Goal, LogAction::DeletedGoal, LogAction::Block] {
            state.logs.push(LogEntry {
                player_id: PlayerId(1),
                match_id: Some(MatchId(1)),
                timestamp: 5,
                action,
            });
        }
        assert_eq!(state.net_goals(MatchId(1), PlayerId(1)), 1);
        assert_eq!(state.net_goals(MatchId(2), PlayerId(1)), 0);
    }

    #[test]
    fn test_canonical_match_encoding_ignores_insertion_order() {
        let a = Match::fixture(MatchId(1), TeamId(1), TeamId(2));
        let b = Match::fixture(MatchId(1), TeamId(2), TeamId(1));
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn test_state_json_shape() {
        let json = r#"{
            "teams": [{"id": 1, "name": "Lions"}, {"id": 2, "name": "Tigers"}],
            "players": [{"id": 1, "name": "Ana", "teamId": 1, "removedAt": 0}],
            "meta": {"round": 0, "byes": []}
        }"#;
        let state: LeagueState = serde_json::from_str(json).unwrap();
        assert_eq!(state.teams.len(), 2);
        assert_eq!(state.players[0].team_id, TeamId(1));
        assert!(state.matches.is_empty());
        assert!(state.admins.is_empty());

        assert!(state.players[0].is_active());

        let mut with_match = state.clone();
        with_match.matches.push(Match::fixture(MatchId(1), TeamId(1), TeamId(2)));
        let text = serde_json::to_string(&with_match).unwrap();
        let back: LeagueState = serde_json::from_str(&text).unwrap();
        assert_eq!(back, with_match);
    }

    #[test]
    fn test_zero_fields_read_as_unset() {
        let json = r#"{
            "id": 3,
            "scores": {"1": 2, "2": 2},
            "startTime": 40,
            "endTime": 0,
            "penaltyStartTime": 0,
            "winnerTeamId": 0
        }"#;
        let m: Match = serde_json::from_str(json).unwrap();
        assert_eq!(m.start_time, Some(40));
        assert_eq!(m.end_time, None);
        assert_eq!(m.winner_team_id, None);
        assert_eq!(m.phase(), MatchPhase::Started);

        let meta: TournamentMeta = serde_json::from_str(
            r#"{"round": 1, "startTime": 5, "endTime": 0, "winnerTeamId": null, "byes": []}"#,
        )
        .unwrap();
        assert_eq!(meta.start_time, Some(5));
        assert!(!meta.has_ended());
        assert_eq!(meta.winner_team_id, None);
    }
}
