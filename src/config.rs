//! Configuration
//!
//! `LeagueRules` are consensus-relevant: every replica must apply transitions
//! with identical rules or roots diverge. `NodeConfig` only drives the binary.

use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::hash::{root_from_hex, RootHash};

/// Weights for the per-player standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerScoring {
    /// Points per net goal
    pub goal: i64,
    /// Points per team leaderboard point
    pub team_point: i64,
    /// Points per block
    pub block: i64,
    /// Points per scored penalty
    pub penalty_hit: i64,
    /// Points per missed penalty (usually negative)
    pub penalty_miss: i64,
    /// Points per foul (usually negative)
    pub foul: i64,
}

impl Default for PlayerScoring {
    fn default() -> Self {
        Self {
            goal: 10,
            team_point: 1,
            block: 7,
            penalty_hit: 5,
            penalty_miss: -1,
            foul: -2,
        }
    }
}

/// Rules for bracket progression and match validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeagueRules {
    /// Leaderboard points for a match win
    pub points_per_win: u32,
    /// Leaderboard points for a bye
    pub points_per_bye: u32,
    /// Shootouts may only start with level regulation scores
    pub shootout_requires_level_score: bool,
    /// Player standings weights
    pub player_scoring: PlayerScoring,
}

impl Default for LeagueRules {
    fn default() -> Self {
        Self {
            points_per_win: 3,
            points_per_bye: 3,
            shootout_requires_level_score: true,
            player_scoring: PlayerScoring::default(),
        }
    }
}

impl LeagueRules {
    /// Parse rules from a JSON document. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::InvalidRules(e.to_string()))
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable missing.
    #[error("missing required variable: {0}")]
    Missing(&'static str),

    /// Variable present but unparsable.
    #[error("invalid value for {name}: {value}")]
    InvalidValue {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },

    /// Rules document failed to parse.
    #[error("invalid rules document: {0}")]
    InvalidRules(String),
}

/// Binary configuration.
#[derive(Clone, Debug, Default)]
pub struct NodeConfig {
    /// Genesis document. `None` runs the built-in demo league.
    pub genesis_path: Option<PathBuf>,
    /// JSON array of sequenced actions to replay.
    pub actions_path: Option<PathBuf>,
    /// Where to write the bincode journal.
    pub journal_out: Option<PathBuf>,
    /// Root the final state must match.
    pub expected_root: Option<RootHash>,
    /// Require submitters to be listed in `state.admins`.
    pub enforce_admins: bool,
    /// Rules document overriding the defaults.
    pub rules_path: Option<PathBuf>,
}

impl NodeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        let expected_root = match lookup("LEAGUE_EXPECTED_ROOT") {
            Some(raw) if !raw.is_empty() => Some(root_from_hex(&raw).ok_or(
                ConfigError::InvalidValue { name: "LEAGUE_EXPECTED_ROOT", value: raw },
            )?),
            _ => None,
        };

        let enforce_admins = match lookup("LEAGUE_ENFORCE_ADMINS") {
            None => false,
            Some(raw) => match raw.as_str() {
                "" | "0" | "false" => false,
                "1" | "true" => true,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "LEAGUE_ENFORCE_ADMINS",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            genesis_path: path("LEAGUE_GENESIS"),
            actions_path: path("LEAGUE_ACTIONS"),
            journal_out: path("LEAGUE_JOURNAL_OUT"),
            expected_root,
            enforce_admins,
            rules_path: path("LEAGUE_RULES"),
        })
    }

    /// Actions without a genesis document cannot be replayed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actions_path.is_some() && self.genesis_path.is_none() {
            return Err(ConfigError::Missing("LEAGUE_GENESIS"));
        }
        Ok(())
    }
}
