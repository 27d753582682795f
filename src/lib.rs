//! Elimination bracket editing: models, propagation logic, and record storage.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use config::Config;
pub use logic::{
    apply_edit, change_handler, change_winner, key_in_next, undo_match, win_match, ChangesValidator,
    EditValidator,
};
pub use models::{
    is_match, is_tournament, BracketError, ChangeError, Edit, Information, Match, MatchId,
    PlayerId, PlayerNameEdit, Score, ScoreEdit, Setup, Slot, Status, Tournament, TournamentId,
    UserId, WinnerEdit,
};
pub use store::{Database, Store, StoreError, Versioned};
