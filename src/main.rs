//! Bracket Ledger Node
//!
//! Replays a league from its genesis document and an action file, or runs a
//! built-in demo tournament. Prints the final root and standings, writes the
//! journal when configured, and re-verifies it by replay.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bracket_ledger::{
    VERSION,
    config::{LeagueRules, NodeConfig},
    core::hash::root_to_hex,
    league::{
        from_genesis_json, iter_source, query, Action, AdminAllowList, Authorizer, GenesisBuilder,
        LeagueMachine, LeagueState, OpenAccess, SequencedAction, Timestamp,
    },
    proof::verify_journal,
};

/// Submitter used for the demo script.
const DEMO_SUBMITTER: &str = "demo-admin";

/// First demo timestamp (2026-01-01T12:00:00Z, milliseconds).
const DEMO_EPOCH_MS: Timestamp = 1_767_268_800_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Bracket Ledger v{}", VERSION);

    let config = NodeConfig::from_env().context("reading configuration")?;
    config.validate().context("validating configuration")?;

    let rules = match &config.rules_path {
        Some(path) => LeagueRules::from_json(&read(path)?)
            .with_context(|| format!("parsing rules {}", path.display()))?,
        None => LeagueRules::default(),
    };

    let (genesis, actions) = match &config.genesis_path {
        Some(path) => {
            let genesis = from_genesis_json(&read(path)?)
                .with_context(|| format!("loading genesis {}", path.display()))?;
            let actions = match &config.actions_path {
                Some(path) => serde_json::from_str::<Vec<SequencedAction>>(&read(path)?)
                    .with_context(|| format!("parsing actions {}", path.display()))?,
                None => Vec::new(),
            };
            (genesis, actions)
        }
        None => {
            info!("No genesis configured, running demo league");
            demo_league()?
        }
    };

    if config.enforce_admins {
        run_league(&config, genesis, actions, &rules, AdminAllowList)
    } else {
        run_league(&config, genesis, actions, &rules, OpenAccess)
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn run_league<A: Authorizer + Copy>(
    config: &NodeConfig,
    genesis: LeagueState,
    actions: Vec<SequencedAction>,
    rules: &LeagueRules,
    authorizer: A,
) -> Result<()> {
    let mut machine = LeagueMachine::new(genesis.clone(), rules.clone(), authorizer)
        .context("initializing league machine")?;

    info!("=== Applying {} actions ===", actions.len());
    let summary = machine.run(&mut iter_source(actions));
    info!(applied = summary.applied, rejected = summary.rejected, "Actions processed");

    report(machine.state(), rules);

    let journal = machine.into_journal();
    let final_root = journal.final_root.unwrap_or(journal.genesis_root);
    info!("Final Root: {}", root_to_hex(&final_root));

    if let Some(path) = &config.journal_out {
        let bytes = journal.to_bytes().context("encoding journal")?;
        fs::write(path, &bytes).with_context(|| format!("writing journal {}", path.display()))?;
        info!(bytes = bytes.len(), path = %path.display(), "Journal written");
    }

    info!("=== Verifying by Replay ===");
    let result = verify_journal(&genesis, &journal, rules, authorizer);
    if !result.valid {
        let reason = result.error.map(|e| e.to_string()).unwrap_or_default();
        bail!("replay verification failed: {}", reason);
    }
    info!(entries = result.entries_checked, "REPLAY VERIFIED: roots match");

    if let Some(expected) = config.expected_root {
        if expected != final_root {
            bail!(
                "final root {} does not match expected {}",
                root_to_hex(&final_root),
                root_to_hex(&expected)
            );
        }
        info!("Expected root matched");
    }

    Ok(())
}

fn render_time(ms: Timestamp) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn report(state: &LeagueState, rules: &LeagueRules) {
    info!("=== Leaderboard ===");
    for (rank, entry) in query::leaderboard(state, rules).iter().enumerate() {
        info!(
            "#{}: {} - {} pts ({}W {}L {}B)",
            rank + 1,
            entry.name,
            entry.points,
            entry.wins,
            entry.losses,
            entry.byes
        );
    }

    let tournament = query::tournament_info(state);
    if let Some(start) = tournament.meta.start_time {
        info!("Started: {}", render_time(start));
    }
    match (&tournament.winner_team, tournament.meta.end_time) {
        (Some(team), Some(end)) => {
            info!("Champion: {} (round {}, {})", team.name, tournament.meta.round, render_time(end))
        }
        _ => warn!(round = tournament.meta.round, "Tournament has not finished"),
    }

    let awards = query::awards(state, rules);
    if let Some(ball) = &awards.golden_ball {
        info!("Golden Ball: {} ({} pts)", ball.info.player.name, ball.points);
    }
    if let Some(boot) = &awards.golden_boot {
        info!("Golden Boot: {} ({} goals)", boot.info.player.name, boot.stats.goals);
    }
}

/// Four teams, two players each, and a scripted knockout ending in a shootout.
fn demo_league() -> Result<(LeagueState, Vec<SequencedAction>)> {
    let genesis = GenesisBuilder::numbered(4, 2)
        .admin(DEMO_SUBMITTER)
        .build()
        .context("building demo genesis")?;

    let script = vec![
        Action::StartTournament,
        // Round 1: Team 1 vs Team 2, Team 3 vs Team 4
        Action::start_match(1),
        Action::goal(1, 1),
        Action::goal(1, 3),
        Action::goal(1, 2),
        Action::end_match(1),
        Action::start_match(2),
        Action::goal(2, 5),
        Action::end_match(2),
        // Final: Team 1 vs Team 3
        Action::start_match(3),
        Action::goal(3, 1),
        Action::goal(3, 6),
        Action::end_match(3),
        Action::start_shootout(3),
        Action::penalty_miss(3, 2),
        Action::penalty_hit(3, 5),
        Action::end_match(3),
    ];

    let actions = script
        .into_iter()
        .enumerate()
        .map(|(i, action)| {
            SequencedAction::new(action, DEMO_SUBMITTER, DEMO_EPOCH_MS + i as u64 * 60_000)
        })
        .collect();

    Ok((genesis, actions))
}
