//! Tournament metadata shared by every stored record: organizer, referees, players and status.

use crate::models::game::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a stored tournament record.
pub type TournamentId = u64;

/// Authenticated user (organizer or referee).
pub type UserId = u64;

/// Lifecycle status of a tournament record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Players are still being registered; no bracket yet.
    #[default]
    Setup,
    /// Bracket built; results can be recorded and edited.
    Started,
}

/// Who runs the tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Information {
    #[serde(default)]
    pub name: String,
    pub organizer: UserId,
    #[serde(default)]
    pub referees: Vec<UserId>,
}

/// The part of a record every status has. Extra fields (matches, origins) are ignored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub id: TournamentId,
    pub information: Information,
    #[serde(default)]
    pub players: BTreeMap<PlayerId, String>,
    pub status: Status,
}

impl Information {
    /// Organizer or one of the referees.
    pub fn is_staff(&self, user: UserId) -> bool {
        user == self.organizer || self.referees.contains(&user)
    }
}
