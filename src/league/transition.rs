//! State Transition Functions
//!
//! `apply` dispatches one action to its handler. Every handler runs all of its
//! checks against `&LeagueState` before taking `&mut`, so a returned error
//! always means the state was not touched.

use tracing::debug;

use crate::config::LeagueRules;
use crate::league::action::{Action, MatchPlayerRef, MatchRef, NewPlayer, PlayerRef, TeamRef};
use crate::league::bracket;
use crate::league::error::{LeagueError, LeagueResult};
use crate::league::events::LeagueEvent;
use crate::league::state::{
    LeagueState, LogAction, LogEntry, Match, MatchId, Player, TeamId, Timestamp,
};

/// Result of one applied transition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// Events in the order they happened
    pub events: Vec<LeagueEvent>,
}

impl TransitionResult {
    fn from_events(events: Vec<LeagueEvent>) -> Self {
        Self { events }
    }

    /// Whether this transition started, deferred, or ended a round.
    pub fn touched_bracket(&self) -> bool {
        self.events.iter().any(LeagueEvent::is_bracket_event)
    }
}

/// Apply one action.
///
/// # Arguments
///
/// * `state` - League state (mutated only on success)
/// * `action` - Validated action
/// * `now` - Sequencer timestamp for this transition, non-zero
/// * `rules` - Bracket and scoring rules
pub fn apply(
    state: &mut LeagueState,
    action: &Action,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    let result = if now == 0 {
        Err(LeagueError::ZeroTimestamp)
    } else {
        dispatch(state, action, now, rules)
    };

    match &result {
        Ok(r) => debug!(
            action = action.name(),
            round = state.meta.round,
            events = r.events.len(),
            "Transition applied"
        ),
        Err(e) => debug!(action = action.name(), code = e.code(), "Transition rejected"),
    }
    result
}

fn dispatch(
    state: &mut LeagueState,
    action: &Action,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    match action {
        Action::StartTournament => start_tournament(state, now, rules),
        Action::StartMatch(r) => start_match(state, r, now),
        Action::StartPenaltyShootout(r) => start_penalty_shootout(state, r, now, rules),
        Action::LogGoal(r) => log_goal(state, r, now),
        Action::RemoveGoal(r) => remove_goal(state, r, now),
        Action::LogBlock(r) => log_plain(state, r, LogAction::Block, now),
        Action::LogFoul(r) => log_plain(state, r, LogAction::Foul, now),
        Action::LogPenaltyHit(r) => log_plain(state, r, LogAction::PenaltyHit, now),
        Action::LogPenaltyMiss(r) => log_plain(state, r, LogAction::PenaltyMiss, now),
        Action::EndMatch(r) => end_match(state, r, now, rules),
        Action::AddPlayer(p) => add_player(state, p),
        Action::RemovePlayer(p) => remove_player(state, p, now),
        Action::LogByes(t) => log_byes(state, t, now, rules),
    }
}

// =============================================================================
// TOURNAMENT
// =============================================================================

fn start_tournament(
    state: &mut LeagueState,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    if state.has_tournament_ended() {
        return Err(LeagueError::TournamentAlreadyEnded);
    }
    if state.meta.round != 0 || state.meta.start_time.is_some() {
        return Err(LeagueError::TournamentAlreadyStarted);
    }

    state.meta.start_time = Some(now);
    let mut events = vec![LeagueEvent::TournamentStarted { at: now }];
    events.extend(bracket::generate_next_round(state, now, rules));
    Ok(TransitionResult::from_events(events))
}

fn log_byes(
    state: &mut LeagueState,
    r: &TeamRef,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    bracket::grant_bye(state, r.team_id, now, rules).map(TransitionResult::from_events)
}

// =============================================================================
// MATCH LIFECYCLE
// =============================================================================

/// Look up a match for a lifecycle action, refusing once the tournament is over.
fn open_match(state: &LeagueState, match_id: MatchId) -> LeagueResult<&Match> {
    if state.has_tournament_ended() {
        return Err(LeagueError::TournamentEnded);
    }
    state
        .get_match(match_id)
        .ok_or(LeagueError::MatchNotFound(match_id))
}

fn start_match(state: &mut LeagueState, r: &MatchRef, now: Timestamp) -> LeagueResult<TransitionResult> {
    let m = open_match(state, r.match_id)?;
    if m.is_started() {
        return Err(LeagueError::MatchAlreadyStarted(r.match_id));
    }

    if let Some(m) = state.get_match_mut(r.match_id) {
        m.start_time = Some(now);
    }
    Ok(TransitionResult::from_events(vec![LeagueEvent::MatchStarted {
        match_id: r.match_id,
    }]))
}

fn start_penalty_shootout(
    state: &mut LeagueState,
    r: &MatchRef,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    let m = open_match(state, r.match_id)?;
    if !m.is_started() {
        return Err(LeagueError::MatchNotStarted(r.match_id));
    }
    if m.is_ended() {
        return Err(LeagueError::MatchEnded(r.match_id));
    }
    if m.penalty_start_time.is_some() {
        return Err(LeagueError::ShootoutAlreadyStarted(r.match_id));
    }
    if rules.shootout_requires_level_score {
        let mut scores = m.scores.values();
        if scores.next() != scores.next() {
            return Err(LeagueError::ScoresNotEqual(r.match_id));
        }
    }

    if let Some(m) = state.get_match_mut(r.match_id) {
        m.penalty_start_time = Some(now);
    }
    Ok(TransitionResult::from_events(vec![LeagueEvent::ShootoutStarted {
        match_id: r.match_id,
    }]))
}

/// Scores that decide a match: regulation plus shootout hits when a shootout happened.
///
/// Penalty hits are credited to the team the player is rostered on, including
/// players removed since. Returned in ascending team order.
pub fn decisive_scores(state: &LeagueState, m: &Match) -> Vec<(TeamId, u32)> {
    let shootout = m.penalty_start_time.is_some();
    let rosters = state.player_teams();

    m.scores
        .iter()
        .map(|(&team_id, &regulation)| {
            let hits = if shootout {
                state
                    .logs
                    .iter()
                    .filter(|l| l.match_id == Some(m.id) && l.action == LogAction::PenaltyHit)
                    .filter(|l| rosters.get(&l.player_id) == Some(&team_id))
                    .count() as u32
            } else {
                0
            };
            (team_id, regulation.saturating_add(hits))
        })
        .collect()
}

fn end_match(
    state: &mut LeagueState,
    r: &MatchRef,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<TransitionResult> {
    let m = open_match(state, r.match_id)?;
    if !m.is_started() {
        return Err(LeagueError::MatchNotStarted(r.match_id));
    }
    if m.is_ended() {
        return Err(LeagueError::MatchAlreadyEnded(r.match_id));
    }

    let scores = decisive_scores(state, m);
    let &[home, away] = scores.as_slice() else {
        return Err(LeagueError::MatchNotConcluded(r.match_id));
    };
    if home.1 == away.1 {
        return Err(LeagueError::MatchNotConcluded(r.match_id));
    }
    let winner = if home.1 > away.1 { home.0 } else { away.0 };

    if let Some(m) = state.get_match_mut(r.match_id) {
        m.end_time = Some(now);
        m.winner_team_id = Some(winner);
    }

    let mut events = vec![LeagueEvent::MatchEnded {
        match_id: r.match_id,
        winner,
        decisive: [home, away],
    }];
    events.extend(bracket::generate_next_round(state, now, rules));
    Ok(TransitionResult::from_events(events))
}

// =============================================================================
// MATCH LOGS
// =============================================================================

/// Check a player may act in a live match and return their team.
fn check_match_action(
    state: &LeagueState,
    r: &MatchPlayerRef,
    action: LogAction,
) -> LeagueResult<TeamId> {
    let m = open_match(state, r.match_id)?;
    if !m.is_started() {
        return Err(LeagueError::MatchNotStarted(r.match_id));
    }
    if m.is_ended() {
        return Err(LeagueError::MatchEnded(r.match_id));
    }

    let player = state
        .player(r.player_id)
        .ok_or(LeagueError::PlayerNotFound(r.player_id))?;
    if !player.is_active() {
        return Err(LeagueError::PlayerRemoved(r.player_id));
    }
    if !m.involves(player.team_id) {
        let [home, away] = m.contestants();
        return Err(LeagueError::PlayerNotInMatch {
            player_id: r.player_id,
            match_id: r.match_id,
            home,
            away,
        });
    }

    if action.is_penalty() && m.penalty_start_time.is_none() {
        return Err(LeagueError::PenaltyNotStarted(r.match_id));
    }
    Ok(player.team_id)
}

fn append_log(state: &mut LeagueState, r: &MatchPlayerRef, action: LogAction, now: Timestamp) -> LeagueEvent {
    state.logs.push(LogEntry {
        player_id: r.player_id,
        match_id: Some(r.match_id),
        timestamp: now,
        action,
    });
    LeagueEvent::ActionLogged {
        match_id: r.match_id,
        player_id: r.player_id,
        action,
    }
}

fn log_goal(state: &mut LeagueState, r: &MatchPlayerRef, now: Timestamp) -> LeagueResult<TransitionResult> {
    let team_id = check_match_action(state, r, LogAction::Goal)?;

    let mut score = 0;
    if let Some(slot) = state
        .get_match_mut(r.match_id)
        .and_then(|m| m.scores.get_mut(&team_id))
    {
        *slot = slot.saturating_add(1);
        score = *slot;
    }
    let logged = append_log(state, r, LogAction::Goal, now);

    Ok(TransitionResult::from_events(vec![
        LeagueEvent::ScoreChanged { match_id: r.match_id, team_id, score },
        logged,
    ]))
}

fn remove_goal(state: &mut LeagueState, r: &MatchPlayerRef, now: Timestamp) -> LeagueResult<TransitionResult> {
    let team_id = check_match_action(state, r, LogAction::DeletedGoal)?;

    let team_score = state
        .get_match(r.match_id)
        .and_then(|m| m.score_of(team_id))
        .unwrap_or(0);
    if team_score == 0 || state.net_goals(r.match_id, r.player_id) <= 0 {
        return Err(LeagueError::NoGoalsToRemove {
            match_id: r.match_id,
            player_id: r.player_id,
        });
    }

    let score = team_score - 1;
    if let Some(slot) = state
        .get_match_mut(r.match_id)
        .and_then(|m| m.scores.get_mut(&team_id))
    {
        *slot = score;
    }
    let logged = append_log(state, r, LogAction::DeletedGoal, now);

    Ok(TransitionResult::from_events(vec![
        LeagueEvent::ScoreChanged { match_id: r.match_id, team_id, score },
        logged,
    ]))
}

/// Blocks, fouls and penalties: a log line and no score change.
fn log_plain(
    state: &mut LeagueState,
    r: &MatchPlayerRef,
    action: LogAction,
    now: Timestamp,
) -> LeagueResult<TransitionResult> {
    check_match_action(state, r, action)?;
    let logged = append_log(state, r, action, now);
    Ok(TransitionResult::from_events(vec![logged]))
}

// =============================================================================
// ROSTER
// =============================================================================

fn add_player(state: &mut LeagueState, p: &NewPlayer) -> LeagueResult<TransitionResult> {
    if state.team(p.team_id).is_none() {
        return Err(LeagueError::TeamNotFound(p.team_id));
    }

    let id = state.next_player_id();
    state.players.push(Player {
        id,
        name: p.player_name.clone(),
        team_id: p.team_id,
        removed_at: None,
    });
    Ok(TransitionResult::from_events(vec![LeagueEvent::PlayerAdded {
        player_id: id,
        team_id: p.team_id,
    }]))
}

fn remove_player(state: &mut LeagueState, p: &PlayerRef, now: Timestamp) -> LeagueResult<TransitionResult> {
    let player = state
        .player(p.player_id)
        .ok_or(LeagueError::PlayerNotFound(p.player_id))?;
    if player.team_id != p.team_id {
        return Err(LeagueError::InvalidTeam {
            player_id: p.player_id,
            expected: p.team_id,
        });
    }
    if !player.is_active() {
        return Err(LeagueError::PlayerAlreadyRemoved(p.player_id));
    }

    if let Some(player) = state.player_mut(p.player_id) {
        player.removed_at = Some(now);
    }
    Ok(TransitionResult::from_events(vec![LeagueEvent::PlayerRemoved {
        player_id: p.player_id,
    }]))
}

// =============================================================================
// TESTS
// =============================================================================
