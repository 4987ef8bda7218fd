//! State Commitment
//!
//! Summarizes a league state into one root hash.
//!
//! Set-like collections (admins, teams, players) go into a sorted Merkle tree;
//! order-sensitive collections (matches, logs) go into a Merkle Mountain Range
//! so they can be updated incrementally. Sub-roots are combined in the fixed
//! order `[admins?, meta, teams, players, matches, logs]`.

use serde::{Serialize, Deserialize};

use crate::core::codec::{CanonicalEncode, CanonicalEncoder};
use crate::core::hash::{RootHash, StateHasher};
use crate::league::error::{LeagueError, LeagueResult};
use crate::league::events::LeagueEvent;
use crate::league::state::{LeagueState, PlayerId, TeamId, TournamentMeta};
use crate::proof::merkle::{hash_leaf, MerkleProof, MerkleTree};
use crate::proof::mmr::MerkleMountainRange;

/// Leading byte of an admin leaf encoding.
const ADMIN_LEAF_TAG: u8 = 0xad;

/// Per-collection roots that make up the state root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRoots {
    /// Admin allow-list root, only when the list is non-empty
    pub admins: Option<RootHash>,
    /// Tournament metadata hash
    pub meta: RootHash,
    /// Teams root
    pub teams: RootHash,
    /// Players root
    pub players: RootHash,
    /// Matches MMR root
    pub matches: RootHash,
    /// Logs MMR root
    pub logs: RootHash,
}

impl SubRoots {
    /// Combine into the final state root.
    pub fn combine(&self) -> RootHash {
        let mut hasher = StateHasher::for_state_root();
        if let Some(admins) = &self.admins {
            hasher.update_hash(admins);
        }
        hasher.update_hash(&self.meta);
        hasher.update_hash(&self.teams);
        hasher.update_hash(&self.players);
        hasher.update_hash(&self.matches);
        hasher.update_hash(&self.logs);
        hasher.finalize()
    }
}

// =============================================================================
// FULL COMPUTATION
// =============================================================================

/// Root hash of a state. Pure, total, and independent of team, player, and
/// admin insertion order.
pub fn compute_root(state: &LeagueState) -> RootHash {
    sub_roots(state).combine()
}

/// Compute every sub-root from scratch.
pub fn sub_roots(state: &LeagueState) -> SubRoots {
    SubRoots {
        admins: admins_root(&state.admins),
        meta: meta_hash(&state.meta),
        teams: sorted_root(&state.teams),
        players: sorted_root(&state.players),
        matches: MerkleMountainRange::from_leaves(state.matches.iter().map(|m| m.canonical_bytes())).root(),
        logs: MerkleMountainRange::from_leaves(state.logs.iter().map(|l| l.canonical_bytes())).root(),
    }
}

/// Hash of the scalar tournament metadata.
pub fn meta_hash(meta: &TournamentMeta) -> RootHash {
    let mut hasher = StateHasher::for_meta();
    hasher.update_bytes(&meta.canonical_bytes());
    hasher.finalize()
}

fn sorted_tree<T: CanonicalEncode>(records: &[T]) -> MerkleTree {
    MerkleTree::from_sorted_leaves(records.iter().map(CanonicalEncode::canonical_bytes))
}

fn sorted_root<T: CanonicalEncode>(records: &[T]) -> RootHash {
    sorted_tree(records).root()
}

fn admin_leaf(identity: &str) -> Vec<u8> {
    let mut enc = CanonicalEncoder::with_tag(ADMIN_LEAF_TAG);
    enc.put_str(identity);
    enc.finish()
}

/// Admin allow-list root. `None` when there are no admins.
pub fn admins_root(admins: &[String]) -> Option<RootHash> {
    if admins.is_empty() {
        return None;
    }
    Some(MerkleTree::from_sorted_leaves(admins.iter().map(|a| admin_leaf(a))).root())
}

// =============================================================================
// INCLUSION PROOFS
// =============================================================================

fn prove_record(tree: &MerkleTree, bytes: &[u8]) -> Option<MerkleProof> {
    tree.index_of(&hash_leaf(bytes))
        .and_then(|index| tree.generate_proof(index))
}

/// Prove a player record is part of the players sub-root.
///
/// Verify with `MerkleTree::verify_proof(&sub_roots.players, &proof, &player.canonical_bytes())`.
pub fn prove_player(state: &LeagueState, player_id: PlayerId) -> LeagueResult<MerkleProof> {
    let player = state
        .player(player_id)
        .ok_or(LeagueError::PlayerNotFound(player_id))?;
    prove_record(&sorted_tree(&state.players), &player.canonical_bytes())
        .ok_or(LeagueError::PlayerNotFound(player_id))
}

/// Prove a team record is part of the teams sub-root.
pub fn prove_team(state: &LeagueState, team_id: TeamId) -> LeagueResult<MerkleProof> {
    let team = state.team(team_id).ok_or(LeagueError::TeamNotFound(team_id))?;
    prove_record(&sorted_tree(&state.teams), &team.canonical_bytes())
        .ok_or(LeagueError::TeamNotFound(team_id))
}

// =============================================================================
// INCREMENTAL COMMITMENT
// =============================================================================

/// Cached commitment that follows one state through its transitions.
///
/// `root()` always equals `compute_root(state)` for the state last passed to
/// `new` or `update`, provided every successful transition is reported.
#[derive(Clone, Debug)]
pub struct StateCommitment {
    admins: Option<RootHash>,
    meta: RootHash,
    teams: RootHash,
    players: RootHash,
    matches: MerkleMountainRange,
    logs: MerkleMountainRange,
}

impl StateCommitment {
    /// Build the cache from a state.
    pub fn new(state: &LeagueState) -> Self {
        Self {
            admins: admins_root(&state.admins),
            meta: meta_hash(&state.meta),
            teams: sorted_root(&state.teams),
            players: sorted_root(&state.players),
            matches: MerkleMountainRange::from_leaves(state.matches.iter().map(|m| m.canonical_bytes())),
            logs: MerkleMountainRange::from_leaves(state.logs.iter().map(|l| l.canonical_bytes())),
        }
    }

    /// Bring the cache up to date after a successful transition.
    ///
    /// Rehashes the metadata, appends new logs and matches, and updates the
    /// match leaves named by `events`. The player tree is rebuilt only when the
    /// roster changed.
    pub fn update(&mut self, state: &LeagueState, events: &[LeagueEvent]) {
        self.meta = meta_hash(&state.meta);

        for match_id in events.iter().filter_map(LeagueEvent::mutated_match) {
            let Some(index) = state.matches.iter().position(|m| m.id == match_id) else {
                continue;
            };
            if index < self.matches.leaf_count() {
                let bytes = state.matches[index].canonical_bytes();
                #[cfg(feature = "debug-tracing")]
                tracing::trace!(match_id = match_id.get(), bytes = %hex::encode(&bytes), "Match leaf updated");
                self.matches.update(index, &bytes);
            }
        }
        for m in state.matches.iter().skip(self.matches.leaf_count()) {
            self.matches.push(&m.canonical_bytes());
        }
        for log in state.logs.iter().skip(self.logs.leaf_count()) {
            let bytes = log.canonical_bytes();
            #[cfg(feature = "debug-tracing")]
            tracing::trace!(bytes = %hex::encode(&bytes), "Log leaf appended");
            self.logs.push(&bytes);
        }

        let roster_changed = events.iter().any(|e| {
            matches!(e, LeagueEvent::PlayerAdded { .. } | LeagueEvent::PlayerRemoved { .. })
        });
        if roster_changed {
            self.players = sorted_root(&state.players);
        }
    }

    /// Current sub-roots.
    pub fn sub_roots(&self) -> SubRoots {
        SubRoots {
            admins: self.admins,
            meta: self.meta,
            teams: self.teams,
            players: self.players,
            matches: self.matches.root(),
            logs: self.logs.root(),
        }
    }

    /// Current state root.
    pub fn root(&self) -> RootHash {
        self.sub_roots().combine()
    }
}
