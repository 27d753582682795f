//! Edit validation: decides whether an edit fits the tournament before anything is applied.

use crate::models::{ChangeError, Edit, Match, MatchId, Tournament};

/// Checks an edit against the tournament it targets. The edit protocol trusts this gate.
pub trait EditValidator {
    fn validate(&self, tournament: &Tournament, edit: &Edit) -> Result<(), ChangeError>;
}

/// Default validator for the three edit kinds.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChangesValidator;

fn bad(msg: impl Into<String>) -> ChangeError {
    ChangeError::BadRequest(msg.into())
}

fn find_match(tournament: &Tournament, id: MatchId) -> Result<&Match, ChangeError> {
    tournament
        .matches
        .get(id)
        .ok_or_else(|| bad(format!("Match {} does not exist", id)))
}

impl EditValidator for ChangesValidator {
    fn validate(&self, tournament: &Tournament, edit: &Edit) -> Result<(), ChangeError> {
        match edit {
            Edit::NameEdit(e) => {
                if !tournament.players.contains_key(&e.player_id) {
                    return Err(bad(format!("Player {} does not exist", e.player_id)));
                }
                if e.edited.trim().is_empty() {
                    return Err(bad("Player name cannot be empty"));
                }
            }
            Edit::ScoreEdit(e) => {
                find_match(tournament, e.match_id)?;
                let [p1_score, p2_score] = e.edited;
                if p1_score.is_some() != p2_score.is_some() {
                    return Err(bad("Scores must be both set or both empty"));
                }
            }
            Edit::WinnerEdit(e) => {
                let m = find_match(tournament, e.match_id)?;
                if let Some(w) = e.edited {
                    if m.p1.is_none() || m.p2.is_none() {
                        return Err(bad(format!("Match {} does not have two players yet", e.match_id)));
                    }
                    if m.slot_of(w).is_none() {
                        return Err(bad(format!("Player {} is not in match {}", w, e.match_id)));
                    }
                }
                // Undo only reaches one layer down, so downstream results must be cleared first.
                if m.winner.is_some() {
                    for (next, _) in m.next_links() {
                        if find_match(tournament, next)?.winner.is_some() {
                            return Err(bad(format!(
                                "Match {} already has a result; clear it before changing match {}",
                                next, e.match_id
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
