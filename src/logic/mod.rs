//! Bracket business logic: propagation, validation, and the edit protocol.

mod bracket;
mod changes;
mod validation;

pub use bracket::{change_winner, key_in_next, undo_match, win_match};
pub use changes::{apply_edit, change_handler};
pub use validation::{ChangesValidator, EditValidator};
