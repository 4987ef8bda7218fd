//! Query Helpers
//!
//! Pure read-only views over a league state, shaped for an API layer.
//! Lookups of missing entities fail with the same `NotFound` errors the
//! transitions use.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::config::{LeagueRules, PlayerScoring};
use crate::league::action::Action;
use crate::league::bracket::{compute_leaderboard, LeaderboardEntry};
use crate::league::error::{LeagueError, LeagueResult};
use crate::league::state::{
    LeagueState, LogAction, Match, MatchId, MatchPhase, Player, PlayerId, Team, TeamId,
    Timestamp, TournamentMeta,
};

// =============================================================================
// MATCHES
// =============================================================================

/// One side of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    /// Team
    pub id: TeamId,
    /// Team name, if the team exists
    pub name: Option<String>,
    /// Regulation score
    pub score: u32,
}

/// Match with team names resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    /// Match
    pub id: MatchId,
    /// Both sides, ascending team id
    pub teams: Vec<TeamScore>,
    /// Kick-off
    pub start_time: Option<Timestamp>,
    /// Final whistle
    pub end_time: Option<Timestamp>,
    /// Shootout start
    pub penalty_start_time: Option<Timestamp>,
    /// Winner
    pub winner_team_id: Option<TeamId>,
    /// Derived lifecycle phase
    pub phase: MatchPhase,
}

fn describe_match(state: &LeagueState, m: &Match) -> MatchInfo {
    MatchInfo {
        id: m.id,
        teams: m
            .scores
            .iter()
            .map(|(&id, &score)| TeamScore {
                id,
                name: state.team(id).map(|t| t.name.clone()),
                score,
            })
            .collect(),
        start_time: m.start_time,
        end_time: m.end_time,
        penalty_start_time: m.penalty_start_time,
        winner_team_id: m.winner_team_id,
        phase: m.phase(),
    }
}

/// Match by id.
pub fn match_info(state: &LeagueState, match_id: MatchId) -> LeagueResult<MatchInfo> {
    state
        .get_match(match_id)
        .map(|m| describe_match(state, m))
        .ok_or(LeagueError::MatchNotFound(match_id))
}

/// All matches in creation order.
pub fn list_matches(state: &LeagueState) -> Vec<MatchInfo> {
    state.matches.iter().map(|m| describe_match(state, m)).collect()
}

/// Matches started and not yet ended.
pub fn live_matches(state: &LeagueState) -> Vec<MatchInfo> {
    state
        .matches
        .iter()
        .filter(|m| m.is_live())
        .map(|m| describe_match(state, m))
        .collect()
}

/// A log line with names resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchLogView {
    /// Player
    pub player_id: PlayerId,
    /// Time
    pub timestamp: Timestamp,
    /// What happened
    pub action: LogAction,
    /// Player name
    pub player_name: Option<String>,
    /// Player's team name
    pub team_name: Option<String>,
}

/// Match plus its full log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Match summary
    #[serde(flatten)]
    pub info: MatchInfo,
    /// Logs for this match in append order
    pub logs: Vec<MatchLogView>,
}

/// Match with its log history.
pub fn match_report(state: &LeagueState, match_id: MatchId) -> LeagueResult<MatchReport> {
    let info = match_info(state, match_id)?;
    let logs = state
        .logs
        .iter()
        .filter(|l| l.match_id == Some(match_id))
        .map(|l| {
            let player = state.player(l.player_id);
            MatchLogView {
                player_id: l.player_id,
                timestamp: l.timestamp,
                action: l.action,
                player_name: player.map(|p| p.name.clone()),
                team_name: player
                    .and_then(|p| state.team(p.team_id))
                    .map(|t| t.name.clone()),
            }
        })
        .collect();
    Ok(MatchReport { info, logs })
}

// =============================================================================
// PLAYERS
// =============================================================================

/// Player with team name resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Roster record
    #[serde(flatten)]
    pub player: Player,
    /// Team name
    pub team: String,
}

/// Player by id.
pub fn player_info(state: &LeagueState, player_id: PlayerId) -> LeagueResult<PlayerInfo> {
    let player = state
        .player(player_id)
        .ok_or(LeagueError::PlayerNotFound(player_id))?;
    let team = state
        .team(player.team_id)
        .ok_or(LeagueError::TeamNotFound(player.team_id))?;
    Ok(PlayerInfo {
        player: player.clone(),
        team: team.name.clone(),
    })
}

/// Players not soft-deleted, in roster order.
pub fn active_players(state: &LeagueState) -> Vec<&Player> {
    state.players.iter().filter(|p| p.is_active()).collect()
}

/// A goal or goal correction in a player's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    /// Match
    pub match_id: Option<MatchId>,
    /// Time
    pub timestamp: Timestamp,
    /// `GOAL` or `DELETED_GOAL`
    pub action: LogAction,
}

/// Player with their goal history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Roster record
    #[serde(flatten)]
    pub player: Player,
    /// Number of `GOAL` entries (corrections are listed, not subtracted)
    pub goal_count: u32,
    /// Goal and correction entries in append order
    pub goals: Vec<GoalRecord>,
}

/// Player by id with goal history. Removed players are still resolvable.
pub fn player_profile(state: &LeagueState, player_id: PlayerId) -> LeagueResult<PlayerProfile> {
    let player = state
        .player(player_id)
        .ok_or(LeagueError::PlayerNotFound(player_id))?;

    let goals: Vec<GoalRecord> = state
        .logs
        .iter()
        .filter(|l| l.player_id == player_id)
        .filter(|l| matches!(l.action, LogAction::Goal | LogAction::DeletedGoal))
        .map(|l| GoalRecord {
            match_id: l.match_id,
            timestamp: l.timestamp,
            action: l.action,
        })
        .collect();
    let goal_count = goals.iter().filter(|g| g.action == LogAction::Goal).count() as u32;

    Ok(PlayerProfile {
        player: player.clone(),
        goal_count,
        goals,
    })
}

// =============================================================================
// STANDINGS
// =============================================================================

/// Team leaderboard.
pub fn leaderboard(state: &LeagueState, rules: &LeagueRules) -> Vec<LeaderboardEntry> {
    compute_leaderboard(state, rules)
}

/// Per-player counters aggregated from logs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    /// Goals net of corrections
    pub goals: i64,
    /// Blocks
    pub blocks: u32,
    /// Scored penalties
    pub penalties: u32,
    /// Missed penalties
    pub penalty_misses: u32,
    /// Fouls
    pub fouls: u32,
}

impl PlayerStats {
    fn record(&mut self, action: LogAction) {
        match action {
            LogAction::Goal => self.goals += 1,
            LogAction::DeletedGoal => self.goals -= 1,
            LogAction::Block => self.blocks += 1,
            LogAction::PenaltyHit => self.penalties += 1,
            LogAction::PenaltyMiss => self.penalty_misses += 1,
            LogAction::Foul => self.fouls += 1,
        }
    }

    /// Weighted standing points.
    pub fn points(&self, team_points: u32, weights: &PlayerScoring) -> i64 {
        self.goals * weights.goal
            + i64::from(team_points) * weights.team_point
            + i64::from(self.blocks) * weights.block
            + i64::from(self.penalties) * weights.penalty_hit
            + i64::from(self.penalty_misses) * weights.penalty_miss
            + i64::from(self.fouls) * weights.foul
    }
}

/// One row of the player standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    /// Player and team name
    #[serde(flatten)]
    pub info: PlayerInfo,
    /// Aggregated counters
    #[serde(flatten)]
    pub stats: PlayerStats,
    /// Weighted points
    pub points: i64,
}

/// Aggregate stats for every player that appears in the logs.
pub fn player_stats(state: &LeagueState) -> BTreeMap<PlayerId, PlayerStats> {
    let mut stats: BTreeMap<PlayerId, PlayerStats> = BTreeMap::new();
    for log in &state.logs {
        stats.entry(log.player_id).or_default().record(log.action);
    }
    stats
}

fn standings<'a>(
    state: &LeagueState,
    players: impl Iterator<Item = &'a Player>,
    rules: &LeagueRules,
) -> Vec<PlayerStanding> {
    let board = compute_leaderboard(state, rules);
    let stats = player_stats(state);

    let mut rows: Vec<PlayerStanding> = players
        .filter(|p| p.is_active())
        .filter_map(|p| player_info(state, p.id).ok())
        .map(|info| {
            let team_points = board
                .iter()
                .find(|e| e.team_id == info.player.team_id)
                .map_or(0, |e| e.points);
            let stats = stats.get(&info.player.id).copied().unwrap_or_default();
            let points = stats.points(team_points, &rules.player_scoring);
            PlayerStanding { info, stats, points }
        })
        .collect();

    rows.sort_by(|a, b| b.points.cmp(&a.points));
    rows
}

/// Active players ranked by weighted points.
pub fn player_leaderboard(state: &LeagueState, rules: &LeagueRules) -> Vec<PlayerStanding> {
    standings(state, state.players.iter(), rules)
}

/// Active players of one team ranked by weighted points.
pub fn team_leaderboard(
    state: &LeagueState,
    team_id: TeamId,
    rules: &LeagueRules,
) -> LeagueResult<Vec<PlayerStanding>> {
    if state.team(team_id).is_none() {
        return Err(LeagueError::TeamNotFound(team_id));
    }
    let roster = state.players.iter().filter(|p| p.team_id == team_id);
    Ok(standings(state, roster, rules))
}

/// Individual awards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Awards {
    /// Most standing points
    pub golden_ball: Option<PlayerStanding>,
    /// Most goals
    pub golden_boot: Option<PlayerStanding>,
    /// Most blocks
    pub golden_glove: Option<PlayerStanding>,
}

/// Awards from the player standings.
///
/// Each award re-sorts the previous ordering, so ties fall back to the
/// earlier criteria.
pub fn awards(state: &LeagueState, rules: &LeagueRules) -> Awards {
    let mut rows = player_leaderboard(state, rules);
    let golden_ball = rows.first().cloned();

    rows.sort_by(|a, b| b.stats.goals.cmp(&a.stats.goals));
    let golden_boot = rows.first().cloned();

    rows.sort_by(|a, b| b.stats.blocks.cmp(&a.stats.blocks));
    let golden_glove = rows.first().cloned();

    Awards { golden_ball, golden_boot, golden_glove }
}

// =============================================================================
// TOURNAMENT
// =============================================================================

/// Tournament progress with the champion resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentInfo {
    /// Raw progress
    #[serde(flatten)]
    pub meta: TournamentMeta,
    /// Champion team
    pub winner_team: Option<Team>,
}

/// Tournament progress.
pub fn tournament_info(state: &LeagueState) -> TournamentInfo {
    TournamentInfo {
        meta: state.meta.clone(),
        winner_team: state
            .meta
            .winner_team_id
            .and_then(|id| state.team(id))
            .cloned(),
    }
}

/// Human-readable labels for an action's references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInfo {
    /// `#id Home vs Away`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_name: Option<String>,
    /// Team name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    /// Player name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

/// Resolve the names an action refers to. Unknown references are left empty.
pub fn describe_action(state: &LeagueState, action: &Action) -> ActionInfo {
    let match_name = action.match_id().and_then(|id| state.get_match(id)).map(|m| {
        let names: Vec<&str> = m
            .team_ids()
            .into_iter()
            .map(|t| state.team(t).map_or("?", |team| team.name.as_str()))
            .collect();
        format!("#{} {}", m.id, names.join(" vs "))
    });

    let (team_id, player_id) = match action {
        Action::LogGoal(r)
        | Action::RemoveGoal(r)
        | Action::LogBlock(r)
        | Action::LogFoul(r)
        | Action::LogPenaltyHit(r)
        | Action::LogPenaltyMiss(r) => (None, Some(r.player_id)),
        Action::AddPlayer(p) => (Some(p.team_id), None),
        Action::RemovePlayer(p) => (Some(p.team_id), Some(p.player_id)),
        Action::LogByes(t) => (Some(t.team_id), None),
        _ => (None, None),
    };

    ActionInfo {
        match_name,
        team_name: team_id.and_then(|id| state.team(id)).map(|t| t.name.clone()),
        player_name: player_id.and_then(|id| state.player(id)).map(|p| p.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::genesis::GenesisBuilder;
    use crate::league::transition::apply;

    fn played() -> LeagueState {
        let rules = LeagueRules::default();
        let mut state = GenesisBuilder::numbered(4, 2).build().unwrap();
        let script = [
            Action::StartTournament,
            Action::start_match(1),
            Action::goal(1, 1),
            Action::goal(1, 1),
            Action::remove_goal(1, 1),
            Action::LogBlock(crate::league::action::MatchPlayerRef {
                match_id: MatchId(1),
                player_id: PlayerId(4),
            }),
            Action::end_match(1),
            Action::start_match(2),
        ];
        for (i, action) in script.iter().enumerate() {
            apply(&mut state, action, 10 + i as u64, &rules).unwrap();
        }
        state
    }

    #[test]
    fn test_match_views() {
        let state = played();
        let info = match_info(&state, MatchId(1)).unwrap();
        assert_eq!(info.teams[0].name.as_deref(), Some("Team 1"));
        assert_eq!(info.teams[0].score, 1);
        assert_eq!(info.phase, MatchPhase::Ended);
        assert_eq!(match_info(&state, MatchId(7)), Err(LeagueError::MatchNotFound(MatchId(7))));

        assert_eq!(list_matches(&state).len(), 2);
        let live = live_matches(&state);
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, MatchId(2));

        let report = match_report(&state, MatchId(1)).unwrap();
        assert_eq!(report.logs.len(), 4);
        assert_eq!(report.logs[3].team_name.as_deref(), Some("Team 2"));
    }

    #[test]
    fn test_player_views() {
        let state = played();
        let info = player_info(&state, PlayerId(4)).unwrap();
        assert_eq!(info.team, "Team 2");
        assert!(matches!(player_info(&state, PlayerId(40)), Err(LeagueError::PlayerNotFound(_))));

        let profile = player_profile(&state, PlayerId(1)).unwrap();
        assert_eq!(profile.goal_count, 2);
        assert_eq!(profile.goals.len(), 3);
        assert_eq!(active_players(&state).len(), 8);
    }

    #[test]
    fn test_player_standings() {
        let state = played();
        let rules = LeagueRules::default();
        let rows = player_leaderboard(&state, &rules);
        assert_eq!(rows.len(), 8);

        // Net one goal (10) plus three team points.
        assert_eq!(rows[0].info.player.id, PlayerId(1));
        assert_eq!(rows[0].stats.goals, 1);
        assert_eq!(rows[0].points, 13);

        // One block (7), losing team has no points.
        let keeper = rows.iter().find(|r| r.info.player.id == PlayerId(4)).unwrap();
        assert_eq!(keeper.points, 7);

        let team = team_leaderboard(&state, TeamId(2), &rules).unwrap();
        assert_eq!(team.len(), 2);
        assert_eq!(team[0].info.player.id, PlayerId(4));
        assert_eq!(team_leaderboard(&state, TeamId(9), &rules), Err(LeagueError::TeamNotFound(TeamId(9))));
    }

    #[test]
    fn test_awards_and_tournament_info() {
        let state = played();
        let awards = awards(&state, &LeagueRules::default());
        assert_eq!(awards.golden_ball.map(|r| r.info.player.id), Some(PlayerId(1)));
        assert_eq!(awards.golden_boot.map(|r| r.info.player.id), Some(PlayerId(1)));
        assert_eq!(awards.golden_glove.map(|r| r.info.player.id), Some(PlayerId(4)));

        let info = tournament_info(&state);
        assert_eq!(info.meta.round, 1);
        assert!(info.winner_team.is_none());
    }

    #[test]
    fn test_describe_action() {
        let state = played();
        let info = describe_action(&state, &Action::goal(1, 3));
        assert_eq!(info.match_name.as_deref(), Some("#1 Team 1 vs Team 2"));
        assert_eq!(info.player_name.as_deref(), Some("Player 2-1"));
        assert!(info.team_name.is_none());

        assert_eq!(describe_action(&state, &Action::StartTournament), ActionInfo::default());
    }
}
