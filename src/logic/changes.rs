//! Edit protocol: load a started tournament, authorize, validate, apply one edit, replace the record.

use crate::logic::bracket::change_winner;
use crate::logic::validation::EditValidator;
use crate::models::{BracketError, ChangeError, Edit, Tournament, TournamentId, UserId};
use crate::store::Store;
use serde_json::Value;

/// Apply `edit` to tournament `id` on behalf of `user` and persist the result.
///
/// The stored record is only replaced after every check and the whole propagation succeeded on an
/// owned copy; any error leaves storage untouched. The replace is rejected with
/// [`ChangeError::Conflict`] if another edit landed in between.
pub fn change_handler<S, V>(
    user: UserId,
    store: &S,
    validator: &V,
    id: TournamentId,
    edit: Edit,
) -> Result<Tournament, ChangeError>
where
    S: Store + ?Sized,
    V: EditValidator + ?Sized,
{
    let loaded = store
        .load(id)?
        .ok_or_else(|| ChangeError::BadRequest("Invalid tournament".to_string()))?;

    if loaded.record.get("status").and_then(Value::as_str) != Some("started") {
        return Err(ChangeError::NotImplemented(
            "Tournament not started yet".to_string(),
        ));
    }

    let mut tournament = Tournament::from_record(loaded.record)?;

    if !tournament.is_staff(user) {
        log::warn!("User {} tried to edit tournament {} without permission", user, id);
        return Err(ChangeError::NotAuthorized);
    }

    validator.validate(&tournament, &edit)?;

    apply_edit(&mut tournament, &edit)?;

    let record = serde_json::to_value(&tournament)
        .map_err(|e| BracketError::MalformedRecord(e.to_string()))?;
    let revision = store.replace(id, record, loaded.revision)?;
    match edit.match_id() {
        Some(match_id) => log::info!(
            "User {} applied {:?} to match {} of tournament {} (revision {})",
            user,
            edit,
            match_id,
            id,
            revision
        ),
        None => log::info!(
            "User {} applied {:?} to tournament {} (revision {})",
            user,
            edit,
            id,
            revision
        ),
    }
    Ok(tournament)
}

/// Apply an already validated edit to the in-memory tournament.
pub fn apply_edit(tournament: &mut Tournament, edit: &Edit) -> Result<(), ChangeError> {
    match edit {
        Edit::NameEdit(e) => {
            tournament.players.insert(e.player_id, e.edited.clone());
        }
        Edit::ScoreEdit(e) => {
            tournament.get_match_mut(e.match_id)?.set_scores(e.edited);
        }
        Edit::WinnerEdit(e) => {
            change_winner(tournament, e.match_id, e.edited)?;
        }
    }
    Ok(())
}
