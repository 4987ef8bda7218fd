//! Genesis
//!
//! Loads and validates the initial league document. Referential integrity is
//! checked once here so that transitions can rely on it.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::league::state::{LeagueState, Player, PlayerId, Team, TeamId};

/// Minimum number of teams for a bracket.
pub const MIN_TEAMS: usize = 2;

/// Malformed genesis. Fatal at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenesisError {
    /// Document is not valid JSON for a league state.
    #[error("genesis parse error: {0}")]
    Parse(String),

    /// Two teams share an id.
    #[error("duplicate team id {0}")]
    DuplicateTeam(TeamId),

    /// Two players share an id.
    #[error("duplicate player id {0}")]
    DuplicatePlayer(PlayerId),

    /// A player references a team that does not exist.
    #[error("player {player_id} references unknown team {team_id}")]
    DanglingTeam {
        /// Player
        player_id: PlayerId,
        /// Missing team
        team_id: TeamId,
    },

    /// Not enough teams for a bracket.
    #[error("at least {} teams required, found {}", MIN_TEAMS, .0)]
    TooFewTeams(usize),

    /// Genesis must start before any play.
    #[error("genesis is not pristine: {0}")]
    NotPristine(&'static str),
}

/// Parse and validate a genesis document.
pub fn from_genesis_json(text: &str) -> Result<LeagueState, GenesisError> {
    let state: LeagueState =
        serde_json::from_str(text).map_err(|e| GenesisError::Parse(e.to_string()))?;
    validate_genesis(&state)?;
    Ok(state)
}

/// Check referential integrity and that no play has happened yet.
pub fn validate_genesis(state: &LeagueState) -> Result<(), GenesisError> {
    if state.teams.len() < MIN_TEAMS {
        return Err(GenesisError::TooFewTeams(state.teams.len()));
    }

    let mut team_ids = BTreeSet::new();
    for team in &state.teams {
        if !team_ids.insert(team.id) {
            return Err(GenesisError::DuplicateTeam(team.id));
        }
    }

    let mut player_ids = BTreeSet::new();
    for player in &state.players {
        if !player_ids.insert(player.id) {
            return Err(GenesisError::DuplicatePlayer(player.id));
        }
        if !team_ids.contains(&player.team_id) {
            return Err(GenesisError::DanglingTeam {
                player_id: player.id,
                team_id: player.team_id,
            });
        }
    }

    let meta = &state.meta;
    if meta.round != 0 || meta.start_time.is_some() {
        return Err(GenesisError::NotPristine("tournament already started"));
    }
    if meta.end_time.is_some() || meta.winner_team_id.is_some() {
        return Err(GenesisError::NotPristine("tournament already ended"));
    }
    if !meta.byes.is_empty() {
        return Err(GenesisError::NotPristine("byes present"));
    }
    if !state.matches.is_empty() {
        return Err(GenesisError::NotPristine("matches present"));
    }
    if !state.logs.is_empty() {
        return Err(GenesisError::NotPristine("logs present"));
    }
    Ok(())
}

/// Programmatic genesis construction.
#[derive(Debug, Default, Clone)]
pub struct GenesisBuilder {
    state: LeagueState,
}

impl GenesisBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// `teams` teams named "Team N", each with `players_per_team` players.
    ///
    /// Player ids are assigned team by team starting at 1.
    pub fn numbered(teams: u64, players_per_team: u64) -> Self {
        let mut builder = Self::new();
        let mut next_player = 1;
        for t in 1..=teams {
            builder = builder.team(t, format!("Team {}", t));
            for n in 1..=players_per_team {
                builder = builder.player(next_player, format!("Player {}-{}", t, n), t);
                next_player += 1;
            }
        }
        builder
    }

    /// Add a team.
    pub fn team(mut self, id: u64, name: impl Into<String>) -> Self {
        self.state.teams.push(Team { id: TeamId(id), name: name.into() });
        self
    }

    /// Add a player.
    pub fn player(mut self, id: u64, name: impl Into<String>, team_id: u64) -> Self {
        self.state.players.push(Player {
            id: PlayerId(id),
            name: name.into(),
            team_id: TeamId(team_id),
            removed_at: None,
        });
        self
    }

    /// Add an admin identity.
    pub fn admin(mut self, identity: impl Into<String>) -> Self {
        self.state.admins.push(identity.into());
        self
    }

    /// Validate and return the genesis state.
    pub fn build(self) -> Result<LeagueState, GenesisError> {
        validate_genesis(&self.state)?;
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::state::TournamentMeta;

    #[test]
    fn test_numbered_builder() {
        let state = GenesisBuilder::numbered(4, 2).admin("ops").build().unwrap();
        assert_eq!(state.teams.len(), 4);
        assert_eq!(state.players.len(), 8);
        assert_eq!(state.players[7].team_id, TeamId(4));
        assert_eq!(state.admins, vec!["ops".to_string()]);
    }

    #[test]
    fn test_integrity_checks() {
        assert_eq!(
            GenesisBuilder::new().team(1, "Solo").build(),
            Err(GenesisError::TooFewTeams(1))
        );
        assert_eq!(
            GenesisBuilder::new().team(1, "A").team(1, "B").build(),
            Err(GenesisError::DuplicateTeam(TeamId(1)))
        );
        assert_eq!(
            GenesisBuilder::numbered(2, 1).player(3, "Ghost", 9).build(),
            Err(GenesisError::DanglingTeam { player_id: PlayerId(3), team_id: TeamId(9) })
        );
        assert_eq!(
            GenesisBuilder::numbered(2, 1).player(1, "Twin", 2).build(),
            Err(GenesisError::DuplicatePlayer(PlayerId(1)))
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "meta": {"round": 0, "byes": []},
            "teams": [{"id": 1, "name": "Lions"}, {"id": 2, "name": "Tigers"}],
            "players": [{"id": 1, "name": "Ana", "teamId": 2}],
            "matches": [],
            "logs": []
        }"#;
        let state = from_genesis_json(json).unwrap();
        assert_eq!(state.players[0].team_id, TeamId(2));

        let started = json.replace(r#""round": 0"#, r#""round": 1"#);
        assert!(matches!(from_genesis_json(&started), Err(GenesisError::NotPristine(_))));
        assert!(matches!(from_genesis_json("{"), Err(GenesisError::Parse(_))));
    }

    #[test]
    fn test_from_json_with_zero_times() {
        let json = r#"{
            "meta": {"round": 0, "startTime": 0, "endTime": 0, "winnerTeamId": 0, "byes": []},
            "teams": [{"id": 1, "name": "Lions"}, {"id": 2, "name": "Tigers"}],
            "players": [
                {"id": 1, "name": "Ana", "teamId": 1, "removedAt": 0},
                {"id": 2, "name": "Ben", "teamId": 2, "removedAt": 0}
            ],
            "matches": [],
            "logs": []
        }"#;
        let state = from_genesis_json(json).unwrap();
        assert_eq!(state.meta, TournamentMeta::default());
        assert!(state.players.iter().all(|p| p.is_active()));

        let built = GenesisBuilder::new()
            .team(1, "Lions")
            .team(2, "Tigers")
            .player(1, "Ana", 1)
            .player(2, "Ben", 2)
            .build()
            .unwrap();
        assert_eq!(state, built);

        let started = json.replace(r#""startTime": 0"#, r#""startTime": 7"#);
        assert_eq!(
            from_genesis_json(&started),
            Err(GenesisError::NotPristine("tournament already started"))
        );
    }
}
