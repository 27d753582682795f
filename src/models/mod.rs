//! Data structures for brackets: matches, tournament records, and edits.

mod changes;
mod game;
mod setup;
mod tournament;

pub use changes::{ChangeError, Edit, PlayerNameEdit, ScoreEdit, WinnerEdit};
pub use game::{is_match, Match, MatchId, PlayerId, Score, Slot};
pub use setup::{Information, Setup, Status, TournamentId, UserId};
pub use tournament::{is_tournament, BracketError, Tournament};
