//! Edit payloads accepted for a started tournament, and the errors an edit can be rejected with.

use crate::models::game::{MatchId, PlayerId, Score};
use crate::models::tournament::BracketError;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};

/// Rename a player.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerNameEdit {
    pub player_id: PlayerId,
    pub edited: String,
}

/// Overwrite both scores of a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEdit {
    pub match_id: MatchId,
    pub edited: [Option<Score>; 2],
}

/// Set (or clear, with `None`) the winner of a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerEdit {
    pub match_id: MatchId,
    pub edited: Option<PlayerId>,
}

/// One edit request, tagged by `type` on the wire.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Edit {
    NameEdit(PlayerNameEdit),
    ScoreEdit(ScoreEdit),
    WinnerEdit(WinnerEdit),
}

impl Edit {
    /// Match the edit targets, if it targets one.
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Edit::NameEdit(_) => None,
            Edit::ScoreEdit(e) => Some(e.match_id),
            Edit::WinnerEdit(e) => Some(e.match_id),
        }
    }
}

/// Why an edit was not applied. Nothing is persisted for any of these.
#[derive(Debug)]
pub enum ChangeError {
    /// Unknown tournament or an edit that does not fit it.
    BadRequest(String),
    /// Caller is neither organizer nor referee.
    NotAuthorized,
    /// Tournament is not in a status that accepts edits.
    NotImplemented(String),
    /// The record was replaced by someone else between load and write.
    Conflict,
    /// Bracket invariant violated while applying the edit.
    Invariant(BracketError),
    /// Storage failed.
    Store(StoreError),
}

impl std::fmt::Display for ChangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeError::BadRequest(msg) => write!(f, "{}", msg),
            ChangeError::NotAuthorized => write!(f, "Not authorized to edit this tournament"),
            ChangeError::NotImplemented(msg) => write!(f, "{}", msg),
            ChangeError::Conflict => {
                write!(f, "Tournament was changed by someone else; reload and retry")
            }
            ChangeError::Invariant(e) => write!(f, "{}", e),
            ChangeError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ChangeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChangeError::Invariant(e) => Some(e),
            ChangeError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BracketError> for ChangeError {
    fn from(e: BracketError) -> Self {
        ChangeError::Invariant(e)
    }
}

impl From<StoreError> for ChangeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { .. } => ChangeError::Conflict,
            other => ChangeError::Store(other),
        }
    }
}

impl ChangeError {
    /// True for invariant violations and storage failures; false for caller mistakes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ChangeError::Invariant(_) | ChangeError::Store(_))
    }
}
