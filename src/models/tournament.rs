//! Started tournament: match arena, origins index, and bracket invariant errors.

use crate::models::game::{is_match, Match, MatchId, PlayerId, Slot};
use crate::models::setup::{Information, Status, TournamentId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Bracket invariant violations. The in-memory graph is inconsistent (bug or corrupted record);
/// an edit that hits one of these is aborted and nothing is persisted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketError {
    /// Undo target is in neither slot of the downstream match.
    CannotUndo { match_id: MatchId, player: PlayerId },
    /// Propagation would overwrite an occupied slot.
    SlotTaken { match_id: MatchId, slot: Slot },
    /// A match cannot be won while one of its slots is empty.
    NullPlayers { match_id: MatchId },
    /// `current` is not listed in `origins[next]`.
    InvalidOriginIndex { current: MatchId, next: MatchId },
    /// `current` feeds both slots of `next` and the caller did not say which player is propagated.
    IsWinnerNotSpecified { current: MatchId, next: MatchId },
    /// Match has a winner but no identifiable loser.
    MissingLoser { match_id: MatchId },
    /// Match id outside the arena.
    UnknownMatch(MatchId),
    /// Stored record does not have the shape of a started tournament.
    MalformedRecord(String),
    /// Links, origins or match contents contradict each other.
    InvalidGraph(String),
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::CannotUndo { match_id, player } => {
                write!(f, "Invalid state - cannot undo player {} in match {}", player, match_id)
            }
            BracketError::SlotTaken { match_id, slot } => {
                write!(f, "Player slot {} of match {} already taken", slot, match_id)
            }
            BracketError::NullPlayers { match_id } => {
                write!(f, "Cannot win match {} with null players", match_id)
            }
            BracketError::InvalidOriginIndex { current, next } => {
                write!(f, "Invalid origin index: match {} does not feed match {}", current, next)
            }
            BracketError::IsWinnerNotSpecified { current, next } => {
                write!(f, "isWinner not specified for match {} feeding both slots of {}", current, next)
            }
            BracketError::MissingLoser { match_id } => {
                write!(f, "Invalid state - match {} has winner but not loser", match_id)
            }
            BracketError::UnknownMatch(id) => write!(f, "Match {} does not exist", id),
            BracketError::MalformedRecord(msg) => write!(f, "Malformed tournament record: {}", msg),
            BracketError::InvalidGraph(msg) => write!(f, "Inconsistent bracket graph: {}", msg),
        }
    }
}

impl std::error::Error for BracketError {}

/// A started tournament as stored: setup metadata plus the bracket graph.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    #[serde(default)]
    pub id: TournamentId,
    pub information: Information,
    #[serde(default)]
    pub players: BTreeMap<PlayerId, String>,
    pub status: Status,
    pub matches: Vec<Match>,
    /// `origins[m]`: matches feeding `m`, in slot order (index 0 → p1, index 1 → p2).
    pub origins: BTreeMap<MatchId, Vec<MatchId>>,
}

/// Structural check for a stored record: status `"started"`, valid matches, and origins whose values are number arrays.
pub fn is_tournament(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    let status_ok = obj.get("status").and_then(Value::as_str) == Some("started");
    let matches_ok = obj
        .get("matches")
        .and_then(Value::as_array)
        .is_some_and(|ms| ms.iter().all(is_match));
    let origins_ok = obj
        .get("origins")
        .and_then(Value::as_object)
        .is_some_and(|os| {
            os.values().all(|v| {
                v.as_array()
                    .is_some_and(|list| list.iter().all(Value::is_number))
            })
        });
    status_ok && matches_ok && origins_ok
}

impl Tournament {
    /// Gate a raw stored record: shape predicate, typed decode, then graph consistency.
    pub fn from_record(record: Value) -> Result<Self, BracketError> {
        if !is_tournament(&record) {
            return Err(BracketError::MalformedRecord(
                "expected started status, matches and origins".to_string(),
            ));
        }
        let tournament: Tournament = serde_json::from_value(record)
            .map_err(|e| BracketError::MalformedRecord(e.to_string()))?;
        tournament.check_graph()?;
        Ok(tournament)
    }

    pub fn get_match(&self, id: MatchId) -> Result<&Match, BracketError> {
        self.matches.get(id).ok_or(BracketError::UnknownMatch(id))
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Result<&mut Match, BracketError> {
        self.matches.get_mut(id).ok_or(BracketError::UnknownMatch(id))
    }

    pub fn is_staff(&self, user: UserId) -> bool {
        self.information.is_staff(user)
    }

    /// Rebuild origins from `winner_next` / `loser_next`: feeders in match order, winner link before loser link.
    pub fn derive_origins(&self) -> BTreeMap<MatchId, Vec<MatchId>> {
        let mut origins: BTreeMap<MatchId, Vec<MatchId>> = BTreeMap::new();
        for (id, m) in self.matches.iter().enumerate() {
            for (next, _) in m.next_links() {
                origins.entry(next).or_default().push(id);
            }
        }
        origins
    }

    /// Verify the stored origins against the links and each match against its own invariants.
    /// Stored origin order is kept as-is; only membership is compared.
    pub fn check_graph(&self) -> Result<(), BracketError> {
        let len = self.matches.len();
        for (id, m) in self.matches.iter().enumerate() {
            if let Some(next) = m.next_links().map(|(n, _)| n).find(|&n| n >= len) {
                return Err(BracketError::InvalidGraph(format!(
                    "match {} links to missing match {}",
                    id, next
                )));
            }
            if m.p1_score.is_some() != m.p2_score.is_some() {
                return Err(BracketError::InvalidGraph(format!(
                    "match {} has only one score set",
                    id
                )));
            }
            if let Some(w) = m.winner {
                if m.p1.is_none() || m.p2.is_none() || m.slot_of(w).is_none() {
                    return Err(BracketError::InvalidGraph(format!(
                        "match {} winner {} is not one of its players",
                        id, w
                    )));
                }
            }
        }

        let derived = self.derive_origins();
        let targets: std::collections::BTreeSet<MatchId> =
            derived.keys().chain(self.origins.keys()).copied().collect();
        for target in targets {
            let mut stored = self.origins.get(&target).cloned().unwrap_or_default();
            let mut expected = derived.get(&target).cloned().unwrap_or_default();
            if target >= len || stored.len() > 2 {
                return Err(BracketError::InvalidGraph(format!(
                    "origins entry for match {} is out of range",
                    target
                )));
            }
            stored.sort_unstable();
            expected.sort_unstable();
            if stored != expected {
                return Err(BracketError::InvalidGraph(format!(
                    "origins of match {} are {:?} but links say {:?}",
                    target, stored, expected
                )));
            }
        }
        Ok(())
    }
}
