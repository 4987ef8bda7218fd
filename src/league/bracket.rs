//! Bracket Engine
//!
//! Ranks teams from completed matches and byes, decides when a round is
//! complete, and generates the next round's fixtures.
//!
//! Planning is split from application: `plan_next_round` is a pure read of
//! the state, and `generate_next_round` applies a plan. Handlers validate with
//! the plan before mutating anything.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::config::LeagueRules;
use crate::league::error::{LeagueError, LeagueResult};
use crate::league::events::LeagueEvent;
use crate::league::state::{Bye, LeagueState, Match, TeamId, Timestamp};

// =============================================================================
// LEADERBOARD
// =============================================================================

/// Ranked standing of one team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Team
    pub team_id: TeamId,
    /// Team name
    pub name: String,
    /// Completed matches won
    pub wins: u32,
    /// Completed matches lost
    pub losses: u32,
    /// Byes received
    pub byes: u32,
    /// Ranking points
    pub points: u32,
}

/// Compute the ranked leaderboard.
///
/// Sorted by points descending, then wins descending, then byes ascending.
/// The sort is stable, so remaining ties keep genesis team order.
pub fn compute_leaderboard(state: &LeagueState, rules: &LeagueRules) -> Vec<LeaderboardEntry> {
    let mut board: Vec<LeaderboardEntry> = state
        .teams
        .iter()
        .map(|team| LeaderboardEntry {
            team_id: team.id,
            name: team.name.clone(),
            wins: 0,
            losses: 0,
            byes: state.meta.byes_for(team.id),
            points: 0,
        })
        .collect();

    for m in state.matches.iter().filter(|m| m.is_ended()) {
        let Some(winner) = m.winner_team_id else {
            continue;
        };
        for team_id in m.team_ids() {
            if let Some(entry) = board.iter_mut().find(|e| e.team_id == team_id) {
                if team_id == winner {
                    entry.wins += 1;
                } else {
                    entry.losses += 1;
                }
            }
        }
    }

    for entry in &mut board {
        entry.points = entry
            .wins
            .saturating_mul(rules.points_per_win)
            .saturating_add(entry.byes.saturating_mul(rules.points_per_bye));
    }

    board.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(b.wins.cmp(&a.wins))
            .then(a.byes.cmp(&b.byes))
    });
    board
}

/// Number of teams still contending in a round: `ceil(total / 2^round)`.
pub fn teams_in_round(total_teams: usize, round: u32) -> usize {
    let total = total_teams as u64;
    match 1u64.checked_shl(round) {
        Some(divisor) if divisor < total => total.div_ceil(divisor) as usize,
        _ => total_teams.min(1),
    }
}

// =============================================================================
// ROUND PLANNING
// =============================================================================

/// What the bracket would do if asked to progress now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPlan {
    /// Matches are still being played (or there is nothing to schedule).
    Pending,
    /// A champion already exists.
    Finished,
    /// A single team remains and becomes champion.
    Champion(TeamId),
    /// Odd contender count with a tie across the cut; a bye must be granted first.
    AwaitingBye {
        /// Round that just completed
        round: u32,
        /// Teams inside the cut
        contenders: Vec<TeamId>,
        /// Teams that may receive the bye
        eligible: Vec<TeamId>,
    },
    /// Fixtures ready to be created.
    Fixtures {
        /// Pairings in leaderboard order (1v2, 3v4, ...)
        pairs: Vec<(TeamId, TeamId)>,
        /// Team excluded to make the count even
        held_out: Option<TeamId>,
    },
}

/// Decide the next bracket step without mutating state.
pub fn plan_next_round(state: &LeagueState, rules: &LeagueRules) -> RoundPlan {
    if state.has_tournament_ended() {
        return RoundPlan::Finished;
    }
    if !state.all_matches_complete() {
        return RoundPlan::Pending;
    }

    let meta = &state.meta;
    let leaderboard = compute_leaderboard(state, rules);
    let remaining = teams_in_round(state.teams.len(), meta.round);

    // A bye granted this round pulls one extra team across the cut.
    let include_bye = remaining > 1 && remaining % 2 == 1 && meta.has_bye_this_round();
    let take = remaining + usize::from(include_bye);
    let mut top: Vec<&LeaderboardEntry> = leaderboard.iter().take(take).collect();

    match top.len() {
        0 => return RoundPlan::Pending,
        1 => return RoundPlan::Champion(top[0].team_id),
        _ => {}
    }

    let mut held_out = None;
    if top.len() % 2 == 1 {
        // Odd and > 1, so at least three entries and remaining <= top.len().
        if top[0].points == top[remaining - 1].points {
            return RoundPlan::AwaitingBye {
                round: meta.round,
                contenders: top[..remaining].iter().map(|e| e.team_id).collect(),
                eligible: bye_eligible(state, &leaderboard, remaining),
            };
        }

        let leader_clear = top[0].points > top[1].points && top[0].points > top[2].points;
        held_out = if leader_clear {
            Some(top.remove(0).team_id)
        } else {
            top.pop().map(|e| e.team_id)
        };
    }

    let pairs = top
        .chunks_exact(2)
        .map(|pair| (pair[0].team_id, pair[1].team_id))
        .collect();

    RoundPlan::Fixtures { pairs, held_out }
}

/// Teams that may take a bye: ranked within the cut or first below it, and
/// not already holding a bye for this round.
fn bye_eligible(
    state: &LeagueState,
    leaderboard: &[LeaderboardEntry],
    remaining: usize,
) -> Vec<TeamId> {
    let round = state.meta.round;
    leaderboard
        .iter()
        .take(remaining + 1)
        .filter(|e| {
            !state
                .meta
                .byes
                .iter()
                .any(|b| b.team_id == e.team_id && b.round == round)
        })
        .map(|e| e.team_id)
        .collect()
}

/// Whether the bracket is blocked waiting for a bye.
pub fn is_bye_required(state: &LeagueState, rules: &LeagueRules) -> bool {
    matches!(plan_next_round(state, rules), RoundPlan::AwaitingBye { .. })
}

// =============================================================================
// APPLICATION
// =============================================================================

/// Progress the bracket if every match is complete.
///
/// Never fails: when progression is not possible it returns without
/// mutating (a deferral is reported as an event).
pub fn generate_next_round(
    state: &mut LeagueState,
    now: Timestamp,
    rules: &LeagueRules,
) -> Vec<LeagueEvent> {
    match plan_next_round(state, rules) {
        RoundPlan::Pending | RoundPlan::Finished => Vec::new(),
        RoundPlan::Champion(winner) => {
            state.meta.winner_team_id = Some(winner);
            state.meta.end_time = Some(now);
            info!(winner = winner.get(), round = state.meta.round, "Tournament ended");
            vec![LeagueEvent::TournamentEnded { winner, at: now }]
        }
        RoundPlan::AwaitingBye { round, .. } => {
            debug!(round, "Fixture generation deferred until a bye is granted");
            vec![LeagueEvent::RoundDeferred { round }]
        }
        RoundPlan::Fixtures { pairs, held_out } => {
            let mut match_ids = Vec::with_capacity(pairs.len());
            for (home, away) in pairs {
                let id = state.next_match_id();
                state.matches.push(Match::fixture(id, home, away));
                match_ids.push(id);
            }
            state.meta.round += 1;
            info!(
                round = state.meta.round,
                fixtures = match_ids.len(),
                held_out = ?held_out.map(TeamId::get),
                "Round scheduled"
            );
            vec![LeagueEvent::RoundScheduled {
                round: state.meta.round,
                match_ids,
                held_out,
            }]
        }
    }
}

/// Validate a bye request without mutating.
pub fn check_bye(state: &LeagueState, team_id: TeamId, rules: &LeagueRules) -> LeagueResult<()> {
    if state.has_tournament_ended() {
        return Err(LeagueError::TournamentEnded);
    }
    if state.team(team_id).is_none() {
        return Err(LeagueError::TeamNotFound(team_id));
    }
    match plan_next_round(state, rules) {
        RoundPlan::AwaitingBye { eligible, .. } if eligible.contains(&team_id) => Ok(()),
        RoundPlan::AwaitingBye { .. } => Err(LeagueError::TeamNotEligibleForBye(team_id)),
        _ => Err(LeagueError::ByeNotRequired),
    }
}

/// Record a bye for the current round and re-run fixture generation.
pub fn grant_bye(
    state: &mut LeagueState,
    team_id: TeamId,
    now: Timestamp,
    rules: &LeagueRules,
) -> LeagueResult<Vec<LeagueEvent>> {
    check_bye(state, team_id, rules)?;

    let round = state.meta.round;
    state.meta.byes.push(Bye { team_id, round });
    debug!(team = team_id.get(), round, "Bye granted");

    let mut events = vec![LeagueEvent::ByeGranted { team_id, round }];
    events.extend(generate_next_round(state, now, rules));
    Ok(events)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::state::{MatchId, Team};

    fn league(n: u64) -> LeagueState {
        LeagueState {
            teams: (1..=n)
                .map(|i| Team { id: TeamId(i), name: format!("Team {}", i) })
                .collect(),
            ..Default::default()
        }
    }

    fn finish(state: &mut LeagueState, id: u64, winner: u64) {
        let m = state.get_match_mut(MatchId(id)).unwrap();
        m.start_time = Some(1);
        m.end_time = Some(2);
        m.winner_team_id = Some(TeamId(winner));
    }

    #[test]
    fn test_teams_in_round() {
        assert_eq!(teams_in_round(6, 0), 6);
        assert_eq!(teams_in_round(6, 1), 3);
        assert_eq!(teams_in_round(6, 2), 2);
        assert_eq!(teams_in_round(6, 3), 1);
        assert_eq!(teams_in_round(4, 2), 1);
        assert_eq!(teams_in_round(5, 200), 1);
        assert_eq!(teams_in_round(0, 0), 0);
    }

    #[test]
    fn test_first_round_pairs_in_genesis_order() {
        let rules = LeagueRules::default();
        let mut state = league(4);
        let events = generate_next_round(&mut state, 100, &rules);

        assert_eq!(state.meta.round, 1);
        assert_eq!(state.matches.len(), 2);
        assert_eq!(state.matches[0].team_ids(), vec![TeamId(1), TeamId(2)]);
        assert_eq!(state.matches[1].team_ids(), vec![TeamId(3), TeamId(4)]);
        assert!(matches!(&events[0], LeagueEvent::RoundScheduled { round: 1, .. }));
    }

    #[test]
    fn test_leaderboard_ordering_and_bye_tiebreak() {
        let rules = LeagueRules::default();
        let mut state = league(4);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 2);
        finish(&mut state, 2, 3);
        state.meta.byes.push(Bye { team_id: TeamId(4), round: 1 });

        let board = compute_leaderboard(&state, &rules);
        let order: Vec<u64> = board.iter().map(|e| e.team_id.get()).collect();
        // 2 and 3 won, 4 has equal points via a bye, 1 lost.
        assert_eq!(order, vec![2, 3, 4, 1]);
        assert_eq!(board[2].points, 3);
        assert_eq!(board[2].wins, 0);
        assert_eq!(board[3].losses, 1);

        let total_wins: u32 = board.iter().map(|e| e.wins).sum();
        assert_eq!(total_wins, 2);
    }

    #[test]
    fn test_pending_while_matches_open() {
        let rules = LeagueRules::default();
        let mut state = league(4);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 1);

        assert_eq!(plan_next_round(&state, &rules), RoundPlan::Pending);
        assert!(generate_next_round(&mut state, 200, &rules).is_empty());
        assert_eq!(state.meta.round, 1);
    }

    #[test]
    fn test_odd_tie_defers_until_bye() {
        let rules = LeagueRules::default();
        let mut state = league(6);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 1);
        finish(&mut state, 2, 3);
        finish(&mut state, 3, 5);

        let events = generate_next_round(&mut state, 200, &rules);
        assert_eq!(events, vec![LeagueEvent::RoundDeferred { round: 1 }]);
        assert_eq!(state.meta.round, 1);
        assert_eq!(state.matches.len(), 3);

        match plan_next_round(&state, &rules) {
            RoundPlan::AwaitingBye { contenders, eligible, .. } => {
                assert_eq!(contenders, vec![TeamId(1), TeamId(3), TeamId(5)]);
                assert_eq!(eligible, vec![TeamId(1), TeamId(3), TeamId(5), TeamId(2)]);
            }
            other => panic!("unexpected plan {:?}", other),
        }

        // Fifth-ranked team sits below the bye window.
        assert_eq!(
            check_bye(&state, TeamId(4), &rules),
            Err(LeagueError::TeamNotEligibleForBye(TeamId(4)))
        );

        let events = grant_bye(&mut state, TeamId(2), 300, &rules).unwrap();
        assert_eq!(events[0], LeagueEvent::ByeGranted { team_id: TeamId(2), round: 1 });
        assert_eq!(state.meta.round, 2);
        assert_eq!(state.matches.len(), 5);
        assert_eq!(state.matches[3].team_ids(), vec![TeamId(1), TeamId(3)]);
        assert_eq!(state.matches[4].team_ids(), vec![TeamId(2), TeamId(5)]);
    }

    #[test]
    fn test_bye_not_required() {
        let rules = LeagueRules::default();
        let mut state = league(6);
        generate_next_round(&mut state, 100, &rules);

        assert_eq!(check_bye(&state, TeamId(1), &rules), Err(LeagueError::ByeNotRequired));
        assert_eq!(check_bye(&state, TeamId(99), &rules), Err(LeagueError::TeamNotFound(TeamId(99))));
    }

    #[test]
    fn test_clear_leader_is_held_out() {
        let rules = LeagueRules::default();
        let mut state = league(6);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 1);
        finish(&mut state, 2, 3);
        finish(&mut state, 3, 5);
        // Team 1 gets an extra bye from an earlier round, lifting it clear.
        state.meta.byes.push(Bye { team_id: TeamId(1), round: 0 });

        match plan_next_round(&state, &rules) {
            RoundPlan::Fixtures { pairs, held_out } => {
                assert_eq!(held_out, Some(TeamId(1)));
                assert_eq!(pairs, vec![(TeamId(3), TeamId(5))]);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_straggler_dropped_when_no_clear_leader() {
        let rules = LeagueRules::default();
        let mut state = league(6);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 1);
        finish(&mut state, 2, 3);
        finish(&mut state, 3, 5);
        // Teams 1 and 3 both step clear of team 5.
        state.meta.byes.push(Bye { team_id: TeamId(1), round: 0 });
        state.meta.byes.push(Bye { team_id: TeamId(3), round: 0 });

        match plan_next_round(&state, &rules) {
            RoundPlan::Fixtures { pairs, held_out } => {
                assert_eq!(held_out, Some(TeamId(5)));
                assert_eq!(pairs, vec![(TeamId(1), TeamId(3))]);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_champion_declared_once() {
        let rules = LeagueRules::default();
        let mut state = league(2);
        generate_next_round(&mut state, 100, &rules);
        finish(&mut state, 1, 2);

        let events = generate_next_round(&mut state, 500, &rules);
        assert_eq!(events, vec![LeagueEvent::TournamentEnded { winner: TeamId(2), at: 500 }]);
        assert_eq!(state.meta.winner_team_id, Some(TeamId(2)));
        assert_eq!(state.meta.end_time, Some(500));

        assert_eq!(plan_next_round(&state, &rules), RoundPlan::Finished);
        assert!(generate_next_round(&mut state, 600, &rules).is_empty());
        assert_eq!(state.meta.end_time, Some(500));
        assert_eq!(state.matches.len(), 1);
    }

    #[test]
    fn test_odd_field_at_genesis_needs_bye() {
        let rules = LeagueRules::default();
        let mut state = league(3);

        assert!(is_bye_required(&state, &rules));
        let events = grant_bye(&mut state, TeamId(1), 100, &rules).unwrap();

        assert!(events.iter().any(|e| matches!(e, LeagueEvent::RoundScheduled { held_out: Some(TeamId(1)), .. })));
        assert_eq!(state.meta.round, 1);
        assert_eq!(state.matches[0].team_ids(), vec![TeamId(2), TeamId(3)]);
    }
}
