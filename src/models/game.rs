//! Match (bracket node) and the two player slots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Position of a match in the tournament's `matches` arena.
pub type MatchId = usize;

/// Key into the tournament's player-name mapping.
pub type PlayerId = u32;

/// Score recorded for one side of a match.
pub type Score = u32;

/// One of the two positions in a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    P1,
    P2,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::P1, Slot::P2];

    pub fn other(self) -> Self {
        match self {
            Slot::P1 => Slot::P2,
            Slot::P2 => Slot::P1,
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::P1 => write!(f, "p1"),
            Slot::P2 => write!(f, "p2"),
        }
    }
}

/// A single bracket match.
///
/// `winner_next` / `loser_next` point at the matches that receive this
/// match's winner and loser; `None` means the player leaves the bracket.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub winner_next: Option<MatchId>,
    pub loser_next: Option<MatchId>,
    pub p1: Option<PlayerId>,
    pub p2: Option<PlayerId>,
    pub p1_score: Option<Score>,
    pub p2_score: Option<Score>,
    pub winner: Option<PlayerId>,
}

/// Wire names of every match field; all must be present in a stored record.
const MATCH_FIELDS: [&str; 7] = [
    "winnerNext",
    "loserNext",
    "p1",
    "p2",
    "p1Score",
    "p2Score",
    "winner",
];

impl Match {
    /// Empty match: no players, no scores, no links.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn player(&self, slot: Slot) -> Option<PlayerId> {
        match slot {
            Slot::P1 => self.p1,
            Slot::P2 => self.p2,
        }
    }

    pub fn player_mut(&mut self, slot: Slot) -> &mut Option<PlayerId> {
        match slot {
            Slot::P1 => &mut self.p1,
            Slot::P2 => &mut self.p2,
        }
    }

    /// Which slot holds `player`, checking p1 first.
    pub fn slot_of(&self, player: PlayerId) -> Option<Slot> {
        Slot::BOTH
            .into_iter()
            .find(|&slot| self.player(slot) == Some(player))
    }

    /// The player opposite the recorded winner, if both are known.
    pub fn loser(&self) -> Option<PlayerId> {
        let winner = self.winner?;
        let slot = self.slot_of(winner)?;
        self.player(slot.other())
    }

    pub fn scores(&self) -> [Option<Score>; 2] {
        [self.p1_score, self.p2_score]
    }

    pub fn set_scores(&mut self, [p1_score, p2_score]: [Option<Score>; 2]) {
        self.p1_score = p1_score;
        self.p2_score = p2_score;
    }

    pub fn clear_scores(&mut self) {
        self.set_scores([None, None]);
    }

    /// Downstream links paired with whether they carry the winner.
    pub fn next_links(&self) -> impl Iterator<Item = (MatchId, bool)> {
        [(self.winner_next, true), (self.loser_next, false)]
            .into_iter()
            .filter_map(|(next, is_winner)| next.map(|n| (n, is_winner)))
    }
}

fn is_nullable_number(v: &Value) -> bool {
    v.is_null() || v.is_u64()
}

/// Structural check for a stored match: every field present and either null or a non-negative integer.
pub fn is_match(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => MATCH_FIELDS
            .iter()
            .all(|field| obj.get(*field).is_some_and(is_nullable_number)),
        None => false,
    }
}
