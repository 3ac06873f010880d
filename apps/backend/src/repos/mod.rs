//! Repository functions returning domain models and `DomainError`.

mod json;

pub mod duels;
pub mod rounds;

pub use duels::{Duel, DuelChanges, NewDuel};
pub use rounds::Round;
