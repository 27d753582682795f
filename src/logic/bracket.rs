//! Bracket propagation: slot resolution, winner assignment, and one-layer undo.

use crate::models::{BracketError, MatchId, PlayerId, Slot, Tournament};

/// Slot of `next` that `current` feeds, according to `origins[next]`.
///
/// When `current` is the only origin of `next` (listed twice, feeding both the winner and loser
/// path), `is_winner` picks the slot: the winner goes to p1, the loser to p2.
pub fn key_in_next(
    tournament: &Tournament,
    current: MatchId,
    next: MatchId,
    is_winner: Option<bool>,
) -> Result<Slot, BracketError> {
    let invalid = BracketError::InvalidOriginIndex { current, next };
    let origins = tournament.origins.get(&next).ok_or(invalid.clone())?;
    match origins.iter().position(|&m| m == current) {
        Some(0) => {
            if origins.get(1) != Some(&current) {
                return Ok(Slot::P1);
            }
            match is_winner {
                Some(true) => Ok(Slot::P1),
                Some(false) => Ok(Slot::P2),
                None => Err(BracketError::IsWinnerNotSpecified { current, next }),
            }
        }
        Some(1) => Ok(Slot::P2),
        _ => Err(invalid),
    }
}

/// Write `player` into the slot of `next` that `current` feeds. Never overwrites.
fn distribute(
    tournament: &mut Tournament,
    current: MatchId,
    next: MatchId,
    player: PlayerId,
    is_winner: bool,
) -> Result<(), BracketError> {
    let slot = key_in_next(tournament, current, next, Some(is_winner))?;
    let target = tournament.get_match_mut(next)?.player_mut(slot);
    if target.is_some() {
        return Err(BracketError::SlotTaken { match_id: next, slot });
    }
    *target = Some(player);
    Ok(())
}

/// Declare the player in `winner` slot the winner of `match_id` and move winner and loser
/// one layer down their `winner_next` / `loser_next` links.
pub fn win_match(
    tournament: &mut Tournament,
    match_id: MatchId,
    winner: Slot,
) -> Result<(), BracketError> {
    let m = tournament.get_match_mut(match_id)?;
    if m.p1.is_none() || m.p2.is_none() {
        return Err(BracketError::NullPlayers { match_id });
    }
    m.winner = m.player(winner);
    let (Some(winning), Some(losing)) = (m.winner, m.player(winner.other())) else {
        return Err(BracketError::NullPlayers { match_id });
    };

    let links = [(m.winner_next, winning), (m.loser_next, losing)];
    for (next, player) in links {
        if let Some(next) = next {
            distribute(tournament, match_id, next, player, player == winning)?;
        }
    }
    Ok(())
}

/// Remove `player` from downstream match `next_id`, clearing that match's scores.
pub fn undo_match(
    tournament: &mut Tournament,
    next_id: MatchId,
    player: PlayerId,
) -> Result<(), BracketError> {
    let next = tournament.get_match_mut(next_id)?;
    let slot = next.slot_of(player).ok_or(BracketError::CannotUndo {
        match_id: next_id,
        player,
    })?;
    next.clear_scores();
    *next.player_mut(slot) = None;
    Ok(())
}

/// Replace the recorded winner of `match_id`: unwind the previous propagation (one layer), then
/// propagate the new winner if there is one.
pub fn change_winner(
    tournament: &mut Tournament,
    match_id: MatchId,
    winner: Option<PlayerId>,
) -> Result<(), BracketError> {
    let m = tournament.get_match(match_id)?.clone();
    if let Some(previous) = m.winner {
        let loser = m.loser().ok_or(BracketError::MissingLoser { match_id })?;
        if let Some(next) = m.winner_next {
            undo_match(tournament, next, previous)?;
        }
        if let Some(next) = m.loser_next {
            undo_match(tournament, next, loser)?;
        }
    }

    let m = tournament.get_match_mut(match_id)?;
    m.winner = winner;
    if let Some(w) = winner {
        let slot = if m.p1 == Some(w) { Slot::P1 } else { Slot::P2 };
        win_match(tournament, match_id, slot)?;
    }
    Ok(())
}
